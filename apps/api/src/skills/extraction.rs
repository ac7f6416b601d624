//! Skill extraction: résumé text (and optional GitHub data) → scored, deduplicated skill profile.
//!
//! Detection, scoring, aggregation and taxonomy mapping are synchronous and pure.
//! Only the `ProfileStore` calls are async.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::skills::confidence::ConfidenceAggregator;
use crate::skills::detector::SkillDetector;
use crate::skills::evidence::EvidenceScorer;
use crate::skills::github::{collect_github_skills, GithubData};
use crate::skills::merge::{merge_skill_sets, SkillSetBuilder};
use crate::skills::models::{
    normalize_skill_name, AuditLogEntry, EvidenceItem, PrivacySettings, SkillAction,
    SkillActionRequest, SkillCategory, SkillItem, SkillProfile, SkillSet, SOURCE_RESUME,
};
use crate::skills::store::{ProfileStore, SkillUpdate};
use crate::skills::taxonomy::TaxonomyMapper;
use crate::skills::vocabulary::SkillVocabulary;

pub struct SkillExtractionEngine {
    detector: SkillDetector,
    scorer: EvidenceScorer,
    aggregator: ConfidenceAggregator,
    mapper: TaxonomyMapper,
    store: Arc<dyn ProfileStore>,
}

impl SkillExtractionEngine {
    pub fn new(
        vocabulary: Arc<SkillVocabulary>,
        store: Arc<dyn ProfileStore>,
    ) -> Result<Self, AppError> {
        let detector = SkillDetector::new(vocabulary.clone())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build skill detector: {e}")))?;
        Ok(Self {
            detector,
            scorer: EvidenceScorer::default(),
            aggregator: ConfidenceAggregator::default(),
            mapper: TaxonomyMapper::new(vocabulary),
            store,
        })
    }

    pub fn detector(&self) -> &SkillDetector {
        &self.detector
    }

    pub fn mapper(&self) -> &TaxonomyMapper {
        &self.mapper
    }

    /// Résumé-sourced skills. Empty text yields an empty set.
    pub fn extract_resume_skills(&self, resume_text: &str) -> SkillSet {
        let mut builder = SkillSetBuilder::new();
        for (skill, spans) in self.detector.detect(resume_text) {
            let mapping = self.mapper.map(&skill);
            let category = mapping.as_ref().map(|m| m.category).unwrap_or(SkillCategory::Technical);
            let taxonomy_id = mapping.as_ref().map(|m| m.taxonomy_id);
            for span in spans {
                let evidence = EvidenceItem {
                    source: SOURCE_RESUME.to_string(),
                    score: self.scorer.score(&span.snippet, &span.matched_text),
                    snippet: span.snippet,
                    offset: Some(span.offset),
                    page_number: Some(span.page_number),
                    line_number: Some(span.line_number),
                    href: None,
                };
                builder.add(
                    &skill,
                    category,
                    taxonomy_id,
                    evidence,
                    Some(span.matched_text.to_lowercase()),
                );
            }
        }
        builder.build(&self.aggregator)
    }

    /// GitHub-sourced skills: languages, repository topics and descriptions, starred projects.
    pub fn extract_github_skills(&self, github: &GithubData) -> SkillSet {
        let mut builder = SkillSetBuilder::new();
        collect_github_skills(github, &self.detector, &self.scorer, &self.mapper, &mut builder);
        builder.build(&self.aggregator)
    }

    /// Builds a profile without persisting it.
    pub fn build_profile(
        &self,
        resume_id: &str,
        resume_text: &str,
        github: Option<&GithubData>,
    ) -> SkillProfile {
        let resume_skills = self.extract_resume_skills(resume_text);
        let skills = match github {
            Some(data) => {
                let github_skills = self.extract_github_skills(data);
                debug!(
                    "Merging {} resume skills with {} GitHub skills",
                    resume_skills.len(),
                    github_skills.len()
                );
                merge_skill_sets(resume_skills, github_skills, &self.aggregator)
            }
            None => resume_skills,
        };

        let now = Utc::now();
        SkillProfile {
            profile_id: Uuid::new_v4(),
            resume_id: resume_id.to_string(),
            skills,
            privacy_settings: PrivacySettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates and persists the profile for a résumé. A résumé that already has a
    /// profile gets the stored one back unchanged.
    pub async fn create_profile(
        &self,
        resume_id: &str,
        resume_text: &str,
        github: Option<&GithubData>,
    ) -> Result<SkillProfile, AppError> {
        if resume_id.trim().is_empty() {
            return Err(AppError::Validation("resume_id must not be empty".to_string()));
        }

        if let Some(existing) = self.store.get_profile_by_resume(resume_id).await? {
            info!(
                "Resume {resume_id} already has skill profile {}",
                existing.profile_id
            );
            return Ok(existing);
        }

        let profile = self.build_profile(resume_id, resume_text, github);
        let stored = self.store.insert_profile(&profile).await?;
        info!(
            "Created skill profile {} for resume {resume_id}: {} skills (github: {})",
            stored.profile_id,
            stored.skills.len(),
            github.is_some()
        );
        Ok(stored)
    }

    /// Applies an accept, reject or edit action to one skill and records it in the audit log.
    ///
    /// The skill is located by its original name, never by `edited_name`. Confidence and
    /// evidence are left untouched.
    pub async fn apply_action(&self, request: &SkillActionRequest) -> Result<SkillItem, AppError> {
        let action: SkillAction = request.action.parse()?;
        // Edit fields are ignored for accept and reject
        let (edited_name, edited_category) = if action == SkillAction::Edit {
            let name = request
                .edited_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty());
            let category = request
                .edited_category
                .as_deref()
                .map(str::parse::<SkillCategory>)
                .transpose()?;
            if name.is_none() && category.is_none() {
                return Err(AppError::Validation(
                    "edit requires edited_name or edited_category".to_string(),
                ));
            }
            (name, category)
        } else {
            (None, None)
        };

        let profile = self
            .store
            .get_profile(request.profile_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Skill profile {} not found", request.profile_id))
            })?;

        let previous = profile.skill(&request.skill_name).cloned().ok_or_else(|| {
            AppError::SkillNotFound(format!(
                "Skill '{}' not found in profile {}",
                request.skill_name, request.profile_id
            ))
        })?;

        let key = normalize_skill_name(&request.skill_name);

        let status = previous.manual_status.transition(action).ok_or_else(|| {
            AppError::Validation(format!(
                "Cannot {action} a skill that is {}",
                previous.manual_status.as_str()
            ))
        })?;

        let mut updated = previous.clone();
        updated.manual_status = status;
        if let Some(name) = edited_name {
            updated.edited_name = Some(name.to_string());
        }
        if let Some(category) = edited_category {
            updated.category = category;
        }

        let now = Utc::now();
        let audit = AuditLogEntry {
            profile_id: profile.profile_id,
            skill_name: previous.name.clone(),
            action,
            previous_value: previous,
            new_value: updated.clone(),
            timestamp: now,
        };
        self.store
            .save_skill_update(SkillUpdate {
                profile_id: profile.profile_id,
                skill_key: &key,
                skill: &updated,
                updated_at: now,
                audit: &audit,
            })
            .await?;

        info!(
            "Skill '{}' in profile {} marked {}",
            updated.name,
            profile.profile_id,
            updated.manual_status.as_str()
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::skills::github::GithubRepository;
    use crate::skills::models::{ManualStatus, SOURCE_GITHUB};
    use crate::skills::store::InMemoryProfileStore;

    const RESUME: &str = "Jane Doe\n\
        Senior backend engineer with 6 years Python experience.\n\
        Experience with Docker and Kubernetes; built a data platform project on AWS.\n\
        Skills: Python, SQL, Leadership";

    fn engine() -> (SkillExtractionEngine, Arc<InMemoryProfileStore>) {
        let store = Arc::new(InMemoryProfileStore::new());
        let engine =
            SkillExtractionEngine::new(Arc::new(SkillVocabulary::builtin()), store.clone()).unwrap();
        (engine, store)
    }

    fn action(profile_id: Uuid, skill: &str, action: &str) -> SkillActionRequest {
        SkillActionRequest {
            profile_id,
            skill_name: skill.to_string(),
            action: action.to_string(),
            edited_name: None,
            edited_category: None,
        }
    }

    #[test]
    fn test_resume_extraction_builds_scored_skills() {
        let (engine, _) = engine();
        let skills = engine.extract_resume_skills(RESUME);

        let python = &skills["python"];
        assert_eq!(python.evidence.len(), 2);
        assert!(python.evidence.iter().all(|e| e.source == SOURCE_RESUME));
        assert_eq!(python.mapped_taxonomy_id.as_deref(), Some("S2.A.2.1"));
        assert_eq!(python.manual_status, ManualStatus::Suggested);
        assert!(python.confidence > 0.0 && python.confidence <= 1.0);
        assert!(python.tags.contains("python"));

        assert_eq!(skills["leadership"].category, SkillCategory::Soft);
        assert!(skills.values().all(|s| !s.evidence.is_empty()));
    }

    #[test]
    fn test_resume_evidence_carries_location() {
        let (engine, _) = engine();
        let skills = engine.extract_resume_skills(RESUME);
        let docker = &skills["docker"].evidence[0];
        assert_eq!(docker.line_number, Some(3));
        assert_eq!(docker.page_number, Some(1));
        assert_eq!(docker.offset, RESUME.find("Docker"));
    }

    #[test]
    fn test_empty_resume_yields_empty_profile() {
        let (engine, _) = engine();
        let profile = engine.build_profile("r-empty", "", None);
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_github_enrichment_merges_into_resume_skills() {
        let (engine, _) = engine();
        let github = GithubData {
            profile_url: Some("https://github.com/jane".to_string()),
            languages: BTreeMap::from([("Python".to_string(), 55.0), ("Rust".to_string(), 20.0)]),
            repositories: vec![GithubRepository {
                name: "pipeline".to_string(),
                stars: 40,
                language: Some("Python".to_string()),
                ..Default::default()
            }],
        };
        let profile = engine.build_profile("r-gh", RESUME, Some(&github));

        let python = &profile.skills["python"];
        let sources: Vec<_> = python.evidence.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec![SOURCE_RESUME, SOURCE_RESUME, SOURCE_GITHUB, SOURCE_GITHUB]);
        assert!(profile.skills.contains_key("rust"));
    }

    #[tokio::test]
    async fn test_create_profile_is_idempotent_per_resume() {
        let (engine, _) = engine();
        let first = engine.create_profile("r-1", RESUME, None).await.unwrap();
        let second = engine.create_profile("r-1", "Totally different text", None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_accept_records_audit() {
        let (engine, store) = engine();
        let profile = engine.create_profile("r-2", RESUME, None).await.unwrap();

        let updated = engine
            .apply_action(&action(profile.profile_id, "Python", "accept"))
            .await
            .unwrap();
        assert_eq!(updated.manual_status, ManualStatus::Accepted);

        let log = store.audit_log(profile.profile_id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].previous_value.manual_status, ManualStatus::Suggested);
        assert_eq!(log[0].new_value.manual_status, ManualStatus::Accepted);
    }

    #[tokio::test]
    async fn test_repeated_accept_adds_audit_entries() {
        let (engine, store) = engine();
        let profile = engine.create_profile("r-3", RESUME, None).await.unwrap();
        for _ in 0..2 {
            engine
                .apply_action(&action(profile.profile_id, "python", "accept"))
                .await
                .unwrap();
        }
        assert_eq!(store.audit_log(profile.profile_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_keeps_key_and_confidence() {
        let (engine, store) = engine();
        let profile = engine.create_profile("r-4", RESUME, None).await.unwrap();
        let before = profile.skills["docker"].clone();

        let mut request = action(profile.profile_id, "Docker", "edit");
        request.edited_name = Some("Docker Compose".to_string());
        let updated = engine.apply_action(&request).await.unwrap();

        assert_eq!(updated.manual_status, ManualStatus::Edited);
        assert_eq!(updated.name, "Docker");
        assert_eq!(updated.display_name(), "Docker Compose");
        assert_eq!(updated.confidence, before.confidence);
        assert_eq!(updated.evidence, before.evidence);

        let reloaded = store.get_profile(profile.profile_id).await.unwrap().unwrap();
        assert_eq!(reloaded.skills["docker"].edited_name.as_deref(), Some("Docker Compose"));
    }

    #[tokio::test]
    async fn test_lookup_ignores_edited_name() {
        let (engine, _) = engine();
        let profile = engine.create_profile("r-5", RESUME, None).await.unwrap();
        let mut request = action(profile.profile_id, "Docker", "edit");
        request.edited_name = Some("Containers".to_string());
        engine.apply_action(&request).await.unwrap();

        let result = engine
            .apply_action(&action(profile.profile_id, "Containers", "accept"))
            .await;
        assert!(matches!(result, Err(AppError::SkillNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_skill_leaves_profile_untouched() {
        let (engine, store) = engine();
        let profile = engine.create_profile("r-6", RESUME, None).await.unwrap();

        let result = engine
            .apply_action(&action(profile.profile_id, "COBOL", "accept"))
            .await;
        assert!(matches!(result, Err(AppError::SkillNotFound(_))));

        let reloaded = store.get_profile(profile.profile_id).await.unwrap().unwrap();
        assert_eq!(reloaded, profile);
        assert!(store.audit_log(profile.profile_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let (engine, _) = engine();
        let result = engine.apply_action(&action(Uuid::new_v4(), "Python", "accept")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_action_and_empty_edit_are_validation_errors() {
        let (engine, _) = engine();
        let profile = engine.create_profile("r-7", RESUME, None).await.unwrap();

        let bad = engine
            .apply_action(&action(profile.profile_id, "Python", "approve"))
            .await;
        assert!(matches!(bad, Err(AppError::Validation(_))));

        let empty_edit = engine
            .apply_action(&action(profile.profile_id, "Python", "edit"))
            .await;
        assert!(matches!(empty_edit, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_category() {
        let (engine, _) = engine();
        let profile = engine.create_profile("r-8", RESUME, None).await.unwrap();
        let mut request = action(profile.profile_id, "SQL", "edit");
        request.edited_category = Some("domain".to_string());
        let updated = engine.apply_action(&request).await.unwrap();
        assert_eq!(updated.category, SkillCategory::Domain);
        assert_eq!(updated.edited_name, None);
    }

    #[tokio::test]
    async fn test_accept_ignores_stray_edit_fields() {
        let (engine, _) = engine();
        let profile = engine.create_profile("r-9", RESUME, None).await.unwrap();
        let mut request = action(profile.profile_id, "SQL", "accept");
        request.edited_category = Some("bogus".to_string());
        request.edited_name = Some("Structured Query Language".to_string());
        let updated = engine.apply_action(&request).await.unwrap();
        assert_eq!(updated.manual_status, ManualStatus::Accepted);
        assert_eq!(updated.category, SkillCategory::Technical);
        assert_eq!(updated.edited_name, None);

        let mut bad_edit = action(profile.profile_id, "SQL", "edit");
        bad_edit.edited_category = Some("bogus".to_string());
        let result = engine.apply_action(&bad_edit).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_action_lookup_normalizes_skill_name() {
        let (engine, _) = engine();
        let profile = engine.create_profile("r-10", RESUME, None).await.unwrap();
        let updated = engine
            .apply_action(&action(profile.profile_id, "  docker ", "reject"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Docker");
        assert_eq!(updated.manual_status, ManualStatus::Rejected);
    }
}
