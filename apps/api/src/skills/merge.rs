use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::skills::confidence::ConfidenceAggregator;
use crate::skills::models::{
    normalize_skill_name, EvidenceItem, ManualStatus, SkillCategory, SkillItem, SkillSet,
};

/// Tag set on a merged skill whose sources mapped it to different taxonomy ids.
pub const TAXONOMY_CONFLICT_TAG: &str = "taxonomy_conflict";

#[derive(Debug, Clone)]
struct PendingSkill {
    name: String,
    category: SkillCategory,
    mapped_taxonomy_id: Option<String>,
    evidence: Vec<EvidenceItem>,
    tags: BTreeSet<String>,
}

/// Collects evidence per skill for one source, then materializes scored `SkillItem`s.
///
/// A skill only enters the builder together with its first evidence item, so every
/// built skill has non-empty evidence.
#[derive(Debug, Clone, Default)]
pub struct SkillSetBuilder {
    pending: BTreeMap<String, PendingSkill>,
}

impl SkillSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends evidence to the skill keyed by `name`, creating it on first sight.
    /// The first call for a key fixes its name, category and taxonomy id.
    pub fn add(
        &mut self,
        name: &str,
        category: SkillCategory,
        mapped_taxonomy_id: Option<&str>,
        evidence: EvidenceItem,
        tag: Option<String>,
    ) {
        let skill = self
            .pending
            .entry(normalize_skill_name(name))
            .or_insert_with(|| PendingSkill {
                name: name.to_string(),
                category,
                mapped_taxonomy_id: mapped_taxonomy_id.map(str::to_string),
                evidence: Vec::new(),
                tags: BTreeSet::new(),
            });
        skill.evidence.push(evidence);
        if let Some(tag) = tag {
            skill.tags.insert(tag);
        }
    }

    /// Scores every skill and assigns a fresh id with `suggested` status.
    pub fn build(self, aggregator: &ConfidenceAggregator) -> SkillSet {
        self.pending
            .into_iter()
            .map(|(key, pending)| {
                let confidence = aggregator.aggregate(&pending.evidence);
                let item = SkillItem {
                    skill_id: Uuid::new_v4(),
                    name: pending.name,
                    category: pending.category,
                    confidence,
                    evidence: pending.evidence,
                    mapped_taxonomy_id: pending.mapped_taxonomy_id,
                    manual_status: ManualStatus::Suggested,
                    edited_name: None,
                    tags: pending.tags,
                };
                (key, item)
            })
            .collect()
    }
}

/// Union of two skill sets keyed by normalized name.
///
/// For a skill present on both sides: evidence is concatenated (primary first),
/// confidence is recomputed over the combined list, tags are unioned, and a missing
/// taxonomy id is filled from the other side. When both sides carry different ids
/// the primary mapping stays and the skill is tagged [`TAXONOMY_CONFLICT_TAG`].
pub fn merge_skill_sets(
    primary: SkillSet,
    secondary: SkillSet,
    aggregator: &ConfidenceAggregator,
) -> SkillSet {
    let mut merged = primary;
    for (key, incoming) in secondary {
        match merged.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => merge_into(slot.get_mut(), incoming, aggregator),
        }
    }
    merged
}

fn merge_into(existing: &mut SkillItem, incoming: SkillItem, aggregator: &ConfidenceAggregator) {
    existing.evidence.extend(incoming.evidence);
    existing.confidence = aggregator.aggregate(&existing.evidence);
    existing.tags.extend(incoming.tags);

    let Some(theirs) = incoming.mapped_taxonomy_id else {
        return;
    };
    match existing.mapped_taxonomy_id.as_deref() {
        None => {
            existing.mapped_taxonomy_id = Some(theirs);
            existing.category = incoming.category;
        }
        Some(ours) if ours != theirs => {
            tracing::debug!(
                skill = %existing.name,
                kept = %ours,
                dropped = %theirs,
                "Taxonomy mapping conflict while merging skill sources"
            );
            existing.tags.insert(TAXONOMY_CONFLICT_TAG.to_string());
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::models::{SOURCE_GITHUB, SOURCE_RESUME};

    fn evidence(source: &str, score: f64) -> EvidenceItem {
        EvidenceItem {
            source: source.to_string(),
            snippet: format!("{source} evidence"),
            score,
            offset: None,
            page_number: None,
            line_number: None,
            href: None,
        }
    }

    fn skill(name: &str, source: &str, scores: &[f64], taxonomy_id: Option<&str>) -> SkillItem {
        let evidence: Vec<_> = scores.iter().map(|s| evidence(source, *s)).collect();
        SkillItem {
            skill_id: Uuid::new_v4(),
            name: name.to_string(),
            category: SkillCategory::Technical,
            confidence: ConfidenceAggregator::default().aggregate(&evidence),
            evidence,
            mapped_taxonomy_id: taxonomy_id.map(str::to_string),
            manual_status: ManualStatus::Suggested,
            edited_name: None,
            tags: BTreeSet::new(),
        }
    }

    fn set(items: Vec<SkillItem>) -> SkillSet {
        items.into_iter().map(|s| (s.key(), s)).collect()
    }

    #[test]
    fn test_merge_concatenates_and_recomputes() {
        let agg = ConfidenceAggregator::default();
        let resume = set(vec![skill("Python", SOURCE_RESUME, &[0.7, 0.7], Some("S2.A.2.1"))]);
        let github = set(vec![skill("python", SOURCE_GITHUB, &[0.5, 0.5, 0.5], Some("S2.A.2.1"))]);
        let resume_conf = resume["python"].confidence;
        let github_conf = github["python"].confidence;

        let merged = merge_skill_sets(resume, github, &agg);
        assert_eq!(merged.len(), 1);
        let python = &merged["python"];
        assert_eq!(python.evidence.len(), 5);
        assert_eq!(python.evidence[0].source, SOURCE_RESUME);
        assert_eq!(python.evidence[4].source, SOURCE_GITHUB);

        // 0.4*1.0 + 0.4*0.58 + 0.2*(2/3)
        let expected = 0.4 + 0.4 * 0.58 + 0.2 * (2.0 / 3.0);
        assert!((python.confidence - expected).abs() < 1e-9);
        assert_ne!(python.confidence, resume_conf.max(github_conf));
        assert_ne!(python.confidence, (resume_conf + github_conf) / 2.0);
    }

    #[test]
    fn test_merge_keeps_disjoint_skills() {
        let agg = ConfidenceAggregator::default();
        let resume = set(vec![skill("Docker", SOURCE_RESUME, &[0.5], None)]);
        let github = set(vec![skill("Rust", SOURCE_GITHUB, &[0.9], Some("S2.A.6.1"))]);
        let merged = merge_skill_sets(resume, github, &agg);
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, vec!["docker", "rust"]);
    }

    #[test]
    fn test_merge_fills_missing_taxonomy_id() {
        let agg = ConfidenceAggregator::default();
        let resume = set(vec![skill("Rust", SOURCE_RESUME, &[0.5], None)]);
        let github = set(vec![skill("Rust", SOURCE_GITHUB, &[0.9], Some("S2.A.6.1"))]);
        let merged = merge_skill_sets(resume, github, &agg);
        assert_eq!(merged["rust"].mapped_taxonomy_id.as_deref(), Some("S2.A.6.1"));
        assert!(!merged["rust"].tags.contains(TAXONOMY_CONFLICT_TAG));
    }

    #[test]
    fn test_merge_conflict_keeps_primary_and_tags() {
        let agg = ConfidenceAggregator::default();
        let resume = set(vec![skill("Go", SOURCE_RESUME, &[0.5], Some("S2.A.5.1"))]);
        let github = set(vec![skill("Go", SOURCE_GITHUB, &[0.9], Some("X9.Z.9.9"))]);
        let merged = merge_skill_sets(resume, github, &agg);
        assert_eq!(merged["go"].mapped_taxonomy_id.as_deref(), Some("S2.A.5.1"));
        assert!(merged["go"].tags.contains(TAXONOMY_CONFLICT_TAG));
    }

    #[test]
    fn test_merge_unions_tags() {
        let agg = ConfidenceAggregator::default();
        let mut a = skill("Kubernetes", SOURCE_RESUME, &[0.5], None);
        a.tags.insert("k8s".to_string());
        let mut b = skill("Kubernetes", SOURCE_GITHUB, &[0.5], None);
        b.tags.insert("kubernetes".to_string());
        let merged = merge_skill_sets(set(vec![a]), set(vec![b]), &agg);
        let tags: Vec<_> = merged["kubernetes"].tags.iter().cloned().collect();
        assert_eq!(tags, vec!["k8s", "kubernetes"]);
    }

    #[test]
    fn test_builder_groups_evidence_and_sets_suggested() {
        let mut builder = SkillSetBuilder::new();
        builder.add("Python", SkillCategory::Technical, Some("S2.A.2.1"), evidence(SOURCE_RESUME, 0.7), Some("python".into()));
        builder.add("python", SkillCategory::Technical, Some("S2.A.2.1"), evidence(SOURCE_RESUME, 0.5), Some("python3".into()));
        let skills = builder.build(&ConfidenceAggregator::default());

        assert_eq!(skills.len(), 1);
        let python = &skills["python"];
        assert_eq!(python.name, "Python");
        assert_eq!(python.evidence.len(), 2);
        assert_eq!(python.manual_status, ManualStatus::Suggested);
        assert_eq!(python.tags.len(), 2);
    }

    #[test]
    fn test_builder_assigns_distinct_ids() {
        let mut builder = SkillSetBuilder::new();
        builder.add("Rust", SkillCategory::Technical, None, evidence(SOURCE_RESUME, 0.5), None);
        builder.add("Go", SkillCategory::Technical, None, evidence(SOURCE_RESUME, 0.5), None);
        let skills = builder.build(&ConfidenceAggregator::default());
        assert_ne!(skills["rust"].skill_id, skills["go"].skill_id);
    }
}
