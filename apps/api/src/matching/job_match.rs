//! Job matching: job description + stored profile → match score, gaps, recommendations.
//!
//! Job-side skills come from the same `SkillDetector` used for résumés. Each job skill
//! is compared against every non-rejected profile skill; the best similarity decides
//! whether it is covered (strictly above the threshold) or a gap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matching::sections::{JobSection, JobSections};
use crate::matching::similarity::{EmbeddingMemo, SimilarityMatcher};
use crate::skills::detector::SkillDetector;
use crate::skills::models::{SkillCategory, SkillItem, SkillProfile};
use crate::skills::taxonomy::TaxonomyMapper;

/// Recommendations returned per match.
pub const MAX_RECOMMENDATIONS: usize = 3;

pub const NO_SKILLS_DETECTED: &str =
    "No recognizable skills were detected in this job description. Try pasting the full requirements section.";

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// A job skill covered by the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedSkill {
    /// Job-side skill name.
    pub name: String,
    pub score: f64,
    /// Category of the covering profile skill.
    pub category: SkillCategory,
    /// Confidence of the covering profile skill.
    pub confidence: f64,
    /// Display name of the covering profile skill.
    pub profile_skill: String,
}

/// A job skill the profile does not cover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingSkill {
    pub name: String,
    /// 1 - best similarity found; 1.0 when nothing in the profile is even weakly similar.
    pub estimated_gap: f64,
    pub category: SkillCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_job_section: Option<JobSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    /// Covered job skills / detected job skills; 0.0 when none were detected.
    pub match_score: f64,
    pub matched_skills: Vec<MatchedSkill>,
    pub missing_skills: Vec<MissingSkill>,
    pub recommendations: Vec<String>,
}

impl MatchResult {
    fn empty() -> Self {
        Self {
            match_score: 0.0,
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            recommendations: vec![NO_SKILLS_DETECTED.to_string()],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JobMatchEngine {
    detector: SkillDetector,
    mapper: TaxonomyMapper,
    matcher: SimilarityMatcher,
}

impl JobMatchEngine {
    pub fn new(detector: SkillDetector, mapper: TaxonomyMapper, matcher: SimilarityMatcher) -> Self {
        Self {
            detector,
            mapper,
            matcher,
        }
    }

    /// Matches a profile against a job description. Never fails: embedding problems
    /// degrade to exact-name matching, and a job text without skills is a zero score.
    pub async fn match_profile(
        &self,
        profile: &SkillProfile,
        job_text: &str,
        top_k: usize,
    ) -> MatchResult {
        let job_skills = self.detector.detect(job_text);
        if job_skills.is_empty() {
            return MatchResult::empty();
        }

        let sections = JobSections::parse(job_text);
        let candidates: Vec<&SkillItem> = profile.matchable_skills().collect();
        let mut memo = EmbeddingMemo::new();

        let mut matched_skills = Vec::new();
        let mut missing_skills = Vec::new();

        for (job_skill, spans) in &job_skills {
            let mut best: Option<(f64, &SkillItem)> = None;
            for &skill in &candidates {
                let score = self.best_score(job_skill, skill, &mut memo).await;
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, skill));
                }
            }

            match best {
                Some((score, skill)) if self.matcher.is_match(score) => {
                    matched_skills.push(MatchedSkill {
                        name: job_skill.clone(),
                        score,
                        category: skill.category,
                        confidence: skill.confidence,
                        profile_skill: skill.display_name().to_string(),
                    });
                }
                _ => {
                    let best_score = best.map_or(0.0, |(s, _)| s);
                    missing_skills.push(MissingSkill {
                        name: job_skill.clone(),
                        estimated_gap: (1.0 - best_score).clamp(0.0, 1.0),
                        category: self.mapper.category_of(job_skill),
                        from_job_section: spans.first().map(|s| sections.section_at(s.offset)),
                    });
                }
            }
        }

        let match_score = matched_skills.len() as f64 / job_skills.len() as f64;

        matched_skills.sort_by(|a, b| b.score.total_cmp(&a.score));
        missing_skills.sort_by(|a, b| b.estimated_gap.total_cmp(&a.estimated_gap));
        let recommendations = build_recommendations(&missing_skills, top_k);
        missing_skills.truncate(top_k);

        debug!(
            "Job match for profile {}: {}/{} job skills covered",
            profile.profile_id,
            matched_skills.len(),
            job_skills.len()
        );

        MatchResult {
            match_score,
            matched_skills,
            missing_skills,
            recommendations,
        }
    }

    /// Best of the canonical name and the user's edited name.
    async fn best_score(&self, job_skill: &str, skill: &SkillItem, memo: &mut EmbeddingMemo) -> f64 {
        let mut score = self
            .matcher
            .compare_memoized(job_skill, &skill.name, memo)
            .await
            .score;
        if let Some(edited) = skill.edited_name.as_deref() {
            let edited_score = self.matcher.compare_memoized(job_skill, edited, memo).await.score;
            score = score.max(edited_score);
        }
        score
    }
}

/// One recommendation per top gap (`missing` is ordered by gap), at most `limit` and
/// never more than [`MAX_RECOMMENDATIONS`]. A full match gets a single congratulatory line.
pub fn build_recommendations(missing: &[MissingSkill], limit: usize) -> Vec<String> {
    if missing.is_empty() {
        return vec![
            "Great match! Your profile covers every skill this job asks for. Lead with your strongest examples."
                .to_string(),
        ];
    }

    missing
        .iter()
        .take(limit.min(MAX_RECOMMENDATIONS))
        .map(|gap| match gap.category {
            SkillCategory::Technical => format!(
                "Consider building a hands-on project or taking a course in {} to close this gap",
                gap.name
            ),
            SkillCategory::Soft => format!(
                "Highlight concrete examples of {} from your experience",
                gap.name
            ),
            SkillCategory::Domain => format!(
                "Emphasize any exposure you have to the {} domain",
                gap.name
            ),
        })
        .collect()
}
