use std::sync::Arc;

use crate::skills::models::SkillCategory;
use crate::skills::vocabulary::SkillVocabulary;

/// Result of mapping a skill name onto the curated taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyMapping {
    pub canonical_name: &'static str,
    pub taxonomy_id: &'static str,
    pub category: SkillCategory,
}

/// Maps detected skill names to stable taxonomy identifiers. Pure lookup.
#[derive(Debug, Clone)]
pub struct TaxonomyMapper {
    vocabulary: Arc<SkillVocabulary>,
}

impl TaxonomyMapper {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Self {
        Self { vocabulary }
    }

    /// `None` means unmapped: the skill may still live in a profile, without a taxonomy id.
    pub fn map(&self, skill_name: &str) -> Option<TaxonomyMapping> {
        self.vocabulary
            .resolve(skill_name)
            .map(|entry| TaxonomyMapping {
                canonical_name: entry.name,
                taxonomy_id: entry.taxonomy_id,
                category: entry.category,
            })
    }

    /// Category of a mapped skill; unmapped names are treated as technical.
    pub fn category_of(&self, skill_name: &str) -> SkillCategory {
        self.map(skill_name)
            .map(|m| m.category)
            .unwrap_or_default()
    }
}
