use once_cell::sync::Lazy;
use regex::Regex;

/// Score of a snippet with no supporting or weakening language.
pub const BASE_EVIDENCE_SCORE: f64 = 0.5;

/// "5 years", "3+ yrs", "10 year"
static TENURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+\+?\s*(?:years?|yrs?)\b").unwrap());

/// Phrase tables used by [`EvidenceScorer`]. Matching is case-insensitive substring search.
#[derive(Debug, Clone)]
pub struct PhraseBoosts {
    pub base: f64,
    /// Phrases that describe demonstrated use of a skill.
    pub affirmations: &'static [(&'static str, f64)],
    /// Phrases that tie a skill to concrete delivered work.
    pub projects: &'static [(&'static str, f64)],
    /// Enumeration phrases; adjustments are negative.
    pub weak: &'static [(&'static str, f64)],
    /// Added when the snippet states a tenure and names the skill.
    pub tenure: f64,
}

const AFFIRMATION_PHRASES: &[(&str, f64)] = &[
    ("experience with", 0.2),
    ("experience in", 0.2),
    ("proficient in", 0.2),
    ("expert in", 0.2),
    ("expertise in", 0.2),
    ("skilled in", 0.15),
    ("worked with", 0.15),
    ("developed using", 0.15),
    ("knowledge of", 0.15),
    ("hands-on", 0.15),
];

const PROJECT_PHRASES: &[(&str, f64)] = &[("project", 0.15), ("built", 0.15)];

const WEAK_PHRASES: &[(&str, f64)] = &[("including", -0.1), ("such as", -0.1)];

impl Default for PhraseBoosts {
    fn default() -> Self {
        Self {
            base: BASE_EVIDENCE_SCORE,
            affirmations: AFFIRMATION_PHRASES,
            projects: PROJECT_PHRASES,
            weak: WEAK_PHRASES,
            tenure: 0.2,
        }
    }
}

/// Scores how strongly a snippet supports a skill claim. Deterministic and stateless.
#[derive(Debug, Clone, Default)]
pub struct EvidenceScorer {
    boosts: PhraseBoosts,
}

impl EvidenceScorer {
    /// Returns a score in `[0, 1]`. Every phrase present contributes once; adjustments stack.
    pub fn score(&self, snippet: &str, skill_name: &str) -> f64 {
        let lower = snippet.to_lowercase();
        if lower.trim().is_empty() {
            return self.boosts.base.clamp(0.0, 1.0);
        }

        let phrase_total: f64 = self
            .boosts
            .affirmations
            .iter()
            .chain(self.boosts.projects)
            .chain(self.boosts.weak)
            .filter(|(phrase, _)| lower.contains(phrase))
            .map(|(_, adjustment)| adjustment)
            .sum();

        let skill = skill_name.trim().to_lowercase();
        let tenure = if !skill.is_empty() && lower.contains(&skill) && TENURE_RE.is_match(&lower) {
            self.boosts.tenure
        } else {
            0.0
        };

        (self.boosts.base + phrase_total + tenure).clamp(0.0, 1.0)
    }
}
