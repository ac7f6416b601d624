use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::skills::detector::SkillDetector;
use crate::skills::evidence::EvidenceScorer;
use crate::skills::merge::SkillSetBuilder;
use crate::skills::models::{EvidenceItem, SkillCategory, SOURCE_GITHUB};
use crate::skills::taxonomy::TaxonomyMapper;

/// Languages considered, by share of code.
const MAX_LANGUAGES: usize = 10;
/// Starred repositories cited as project evidence.
const MAX_PROJECT_HIGHLIGHTS: usize = 5;

/// Structured GitHub activity, as returned by the GitHub data collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GithubData {
    #[serde(default)]
    pub profile_url: Option<String>,
    /// Language name → percentage of code (0–100).
    #[serde(default)]
    pub languages: BTreeMap<String, f64>,
    /// Ordered by star count, descending.
    #[serde(default)]
    pub repositories: Vec<GithubRepository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GithubRepository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_fork: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proficiency {
    Advanced,
    Intermediate,
    Familiar,
}

impl Proficiency {
    pub fn from_share(percentage: f64) -> Self {
        if percentage > 30.0 {
            Proficiency::Advanced
        } else if percentage > 10.0 {
            Proficiency::Intermediate
        } else {
            Proficiency::Familiar
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Proficiency::Advanced => "Advanced",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Familiar => "Familiar",
        }
    }

    pub fn evidence_score(&self) -> f64 {
        match self {
            Proficiency::Advanced => 0.9,
            Proficiency::Intermediate => 0.75,
            Proficiency::Familiar => 0.6,
        }
    }
}

/// Derives GitHub-sourced skill evidence from languages, repository topics and
/// descriptions, and the most starred projects.
pub fn collect_github_skills(
    data: &GithubData,
    detector: &SkillDetector,
    scorer: &EvidenceScorer,
    mapper: &TaxonomyMapper,
    builder: &mut SkillSetBuilder,
) {
    let owned: Vec<&GithubRepository> = data.repositories.iter().filter(|r| !r.is_fork).collect();

    // Languages by share of code
    let mut languages: Vec<(&String, f64)> = data.languages.iter().map(|(l, p)| (l, *p)).collect();
    languages.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (language, percentage) in languages.into_iter().take(MAX_LANGUAGES) {
        let proficiency = Proficiency::from_share(percentage);
        let snippet = format!(
            "GitHub: {percentage:.1}% of code, {} proficiency",
            proficiency.label()
        );
        add_named(
            builder,
            mapper,
            language,
            github_evidence(snippet, proficiency.evidence_score(), data.profile_url.clone()),
        );
    }

    // Topics and descriptions
    for repo in &owned {
        for topic in &repo.topics {
            let topic = topic.trim();
            if topic.is_empty() {
                continue;
            }
            let snippet = format!("Used in GitHub project {}", repo.name);
            let score = scorer.score(&snippet, topic);
            add_named(
                builder,
                mapper,
                topic,
                github_evidence(snippet, score, repo.url.clone()),
            );
        }

        let Some(description) = repo.description.as_deref() else {
            continue;
        };
        for (skill, spans) in detector.detect(description) {
            let Some(span) = spans.into_iter().next() else {
                continue;
            };
            let score = scorer.score(&span.snippet, &skill);
            add_named(
                builder,
                mapper,
                &skill,
                github_evidence(span.snippet, score, repo.url.clone()),
            );
        }
    }

    // Starred projects
    let mut starred = owned.clone();
    starred.sort_by(|a, b| b.stars.cmp(&a.stars));
    for repo in starred.into_iter().take(MAX_PROJECT_HIGHLIGHTS) {
        let Some(language) = repo.language.as_deref() else {
            continue;
        };
        let snippet = format!("Project: {} ({} stars)", repo.name, repo.stars);
        let score = scorer.score(&snippet, language);
        add_named(
            builder,
            mapper,
            language,
            github_evidence(snippet, score, repo.url.clone()),
        );
    }
}

/// Adds evidence under the canonical name when mapped, else under the name as given.
fn add_named(
    builder: &mut SkillSetBuilder,
    mapper: &TaxonomyMapper,
    raw_name: &str,
    evidence: EvidenceItem,
) {
    match mapper.map(raw_name) {
        Some(mapping) => builder.add(
            mapping.canonical_name,
            mapping.category,
            Some(mapping.taxonomy_id),
            evidence,
            None,
        ),
        None => builder.add(raw_name, SkillCategory::Technical, None, evidence, None),
    }
}

fn github_evidence(snippet: String, score: f64, href: Option<String>) -> EvidenceItem {
    EvidenceItem {
        source: SOURCE_GITHUB.to_string(),
        snippet,
        score: score.clamp(0.0, 1.0),
        offset: None,
        page_number: None,
        line_number: None,
        href,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::skills::confidence::ConfidenceAggregator;
    use crate::skills::models::SkillSet;
    use crate::skills::vocabulary::SkillVocabulary;

    fn repo(name: &str, stars: u32, language: Option<&str>) -> GithubRepository {
        GithubRepository {
            name: name.to_string(),
            stars,
            language: language.map(str::to_string),
            url: Some(format!("https://github.com/dev/{name}")),
            ..Default::default()
        }
    }

    fn extract(data: &GithubData) -> SkillSet {
        let vocabulary = Arc::new(SkillVocabulary::builtin());
        let detector = SkillDetector::new(vocabulary.clone()).unwrap();
        let mapper = TaxonomyMapper::new(vocabulary);
        let mut builder = SkillSetBuilder::new();
        collect_github_skills(data, &detector, &EvidenceScorer::default(), &mapper, &mut builder);
        builder.build(&ConfidenceAggregator::default())
    }

    #[test]
    fn test_proficiency_thresholds() {
        assert_eq!(Proficiency::from_share(45.0), Proficiency::Advanced);
        assert_eq!(Proficiency::from_share(30.0), Proficiency::Intermediate);
        assert_eq!(Proficiency::from_share(10.5), Proficiency::Intermediate);
        assert_eq!(Proficiency::from_share(10.0), Proficiency::Familiar);
    }

    #[test]
    fn test_language_evidence() {
        let data = GithubData {
            profile_url: Some("https://github.com/dev".to_string()),
            languages: BTreeMap::from([("Rust".to_string(), 42.0)]),
            repositories: vec![],
        };
        let skills = extract(&data);
        let rust = &skills["rust"];
        assert_eq!(rust.mapped_taxonomy_id.as_deref(), Some("S2.A.6.1"));
        assert_eq!(rust.evidence[0].snippet, "GitHub: 42.0% of code, Advanced proficiency");
        assert_eq!(rust.evidence[0].score, 0.9);
        assert_eq!(rust.evidence[0].source, SOURCE_GITHUB);
        assert_eq!(rust.evidence[0].href.as_deref(), Some("https://github.com/dev"));
    }

    #[test]
    fn test_only_top_ten_languages() {
        let languages = (0..12)
            .map(|i| (format!("Lang{i:02}"), 50.0 - i as f64))
            .collect();
        let data = GithubData {
            languages,
            ..Default::default()
        };
        let skills = extract(&data);
        assert_eq!(skills.len(), MAX_LANGUAGES);
        assert!(!skills.contains_key("lang11"));
    }

    #[test]
    fn test_topics_resolved_or_kept_unmapped() {
        let mut r = repo("infra", 3, None);
        r.topics = vec!["kubernetes".to_string(), "homelab".to_string()];
        let data = GithubData {
            repositories: vec![r],
            ..Default::default()
        };
        let skills = extract(&data);
        assert_eq!(skills["kubernetes"].name, "Kubernetes");
        assert_eq!(skills["kubernetes"].mapped_taxonomy_id.as_deref(), Some("S3.C.3.1"));
        assert_eq!(skills["homelab"].mapped_taxonomy_id, None);
        assert_eq!(skills["homelab"].category, SkillCategory::Technical);
    }

    #[test]
    fn test_description_is_scanned() {
        let mut r = repo("api", 1, None);
        r.description = Some("REST service built with FastAPI and PostgreSQL".to_string());
        let data = GithubData {
            repositories: vec![r],
            ..Default::default()
        };
        let skills = extract(&data);
        assert!(skills.contains_key("fastapi"));
        assert!(skills.contains_key("postgresql"));
    }

    #[test]
    fn test_forks_are_ignored() {
        let mut fork = repo("linux", 90_000, Some("C"));
        fork.is_fork = true;
        fork.topics = vec!["docker".to_string()];
        let data = GithubData {
            repositories: vec![fork],
            ..Default::default()
        };
        assert!(extract(&data).is_empty());
    }

    #[test]
    fn test_top_five_starred_projects() {
        let repositories = (0..7)
            .map(|i| repo(&format!("proj{i}"), 100 - i, Some("Python")))
            .collect();
        let data = GithubData {
            repositories,
            ..Default::default()
        };
        let skills = extract(&data);
        let python = &skills["python"];
        assert_eq!(python.evidence.len(), MAX_PROJECT_HIGHLIGHTS);
        assert_eq!(python.evidence[0].snippet, "Project: proj0 (100 stars)");
        assert_eq!(
            python.evidence[0].href.as_deref(),
            Some("https://github.com/dev/proj0")
        );
    }
}
