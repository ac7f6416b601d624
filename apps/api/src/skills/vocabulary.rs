//! Curated skill vocabulary: canonical names with their aliases, taxonomy codes and categories.
//!
//! Immutable reference data. Built once at startup and shared behind an `Arc`.

use std::collections::HashMap;

use crate::skills::models::SkillCategory;

/// Aliases this short (in characters) only count when the snippet reads like a skill context.
const SHORT_ALIAS_MAX_LEN: usize = 2;

/// One curated skill.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyEntry {
    pub name: &'static str,
    pub taxonomy_id: &'static str,
    pub category: SkillCategory,
    pub aliases: &'static [&'static str],
    /// The canonical name is an ordinary English word (e.g. "Swift") and needs skill context.
    pub ambiguous_name: bool,
}

impl VocabularyEntry {
    /// Canonical name followed by every alias.
    pub fn phrases(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    /// Whether a detection of `phrase` must be confirmed by surrounding context.
    pub fn requires_context(&self, phrase: &str) -> bool {
        phrase.chars().count() <= SHORT_ALIAS_MAX_LEN || (self.ambiguous_name && phrase == self.name)
    }
}

const fn entry(
    name: &'static str,
    taxonomy_id: &'static str,
    category: SkillCategory,
    aliases: &'static [&'static str],
) -> VocabularyEntry {
    VocabularyEntry {
        name,
        taxonomy_id,
        category,
        aliases,
        ambiguous_name: false,
    }
}

const fn ambiguous(
    name: &'static str,
    taxonomy_id: &'static str,
    category: SkillCategory,
    aliases: &'static [&'static str],
) -> VocabularyEntry {
    VocabularyEntry {
        name,
        taxonomy_id,
        category,
        aliases,
        ambiguous_name: true,
    }
}

use SkillCategory::{Domain, Soft, Technical};

const BUILTIN_ENTRIES: &[VocabularyEntry] = &[
    // Programming languages
    entry("Python", "S2.A.2.1", Technical, &["Python3", "Python 3"]),
    entry("JavaScript", "S2.A.3.1", Technical, &["JS", "ECMAScript"]),
    entry("TypeScript", "S2.A.3.2", Technical, &["TS"]),
    entry("Java", "S2.A.4.1", Technical, &["Java SE", "Java EE"]),
    entry("Kotlin", "S2.A.4.2", Technical, &[]),
    entry("C++", "S2.A.1.1", Technical, &["CPP", "C plus plus"]),
    entry("C#", "S2.A.1.2", Technical, &["C Sharp", "CSharp"]),
    entry("Go", "S2.A.5.1", Technical, &["Golang"]),
    entry("Rust", "S2.A.6.1", Technical, &["Rust lang"]),
    entry("Ruby", "S2.A.7.1", Technical, &[]),
    ambiguous("Swift", "S2.A.8.1", Technical, &["SwiftUI"]),
    // Web frameworks and APIs
    entry("React", "S2.B.1.1", Technical, &["ReactJS", "React.js"]),
    entry("Angular", "S2.B.1.2", Technical, &["AngularJS"]),
    entry("Vue.js", "S2.B.1.3", Technical, &["Vue", "VueJS"]),
    entry("Node.js", "S2.B.2.1", Technical, &["NodeJS", "Node JS"]),
    entry("Django", "S2.B.3.1", Technical, &[]),
    entry("Flask", "S2.B.3.2", Technical, &[]),
    entry("FastAPI", "S2.B.3.3", Technical, &[]),
    entry("GraphQL", "S2.B.4.1", Technical, &[]),
    entry("REST APIs", "S2.B.4.2", Technical, &["REST API", "RESTful", "RESTful API"]),
    entry("Microservices", "S2.B.4.3", Technical, &["Microservice", "Microservice architecture"]),
    // Cloud and infrastructure
    entry("AWS", "S3.C.1.1", Technical, &["Amazon Web Services"]),
    entry("Azure", "S3.C.1.2", Technical, &["Microsoft Azure"]),
    entry("GCP", "S3.C.1.3", Technical, &["Google Cloud", "Google Cloud Platform"]),
    entry("Docker", "S3.C.2.1", Technical, &["Docker containers"]),
    entry("Kubernetes", "S3.C.3.1", Technical, &["K8s"]),
    entry("Terraform", "S3.C.4.1", Technical, &[]),
    entry("Linux", "S3.C.5.1", Technical, &["Unix"]),
    // Data stores
    entry("SQL", "S4.D.1.1", Technical, &["Structured Query Language"]),
    entry("PostgreSQL", "S4.D.2.1", Technical, &["Postgres"]),
    entry("MySQL", "S4.D.2.2", Technical, &[]),
    entry("MongoDB", "S4.D.3.1", Technical, &["Mongo"]),
    entry("Redis", "S4.D.3.2", Technical, &[]),
    // Machine learning and data
    entry("Machine Learning", "S5.E.1.1", Technical, &["ML"]),
    entry("Deep Learning", "S5.E.2.1", Technical, &["Neural Networks", "DL"]),
    entry("TensorFlow", "S5.E.3.1", Technical, &[]),
    entry("PyTorch", "S5.E.3.2", Technical, &[]),
    entry("Pandas", "S5.E.3.3", Technical, &[]),
    entry("NLP", "S5.E.4.1", Technical, &["Natural Language Processing"]),
    entry("Data Science", "S5.E.5.1", Technical, &[]),
    // Tooling
    entry("Git", "S6.F.1.1", Technical, &["GitHub", "GitLab"]),
    entry("CI/CD", "S6.F.2.1", Technical, &["CI CD", "CICD", "Continuous Integration", "Continuous Deployment"]),
    // Ways of working and soft skills
    entry("Agile", "S7.G.1.1", Soft, &["Agile methodology"]),
    entry("Scrum", "S7.G.2.1", Soft, &[]),
    entry("Communication", "S7.G.3.1", Soft, &["Communication skills"]),
    entry("Leadership", "S7.G.4.1", Soft, &["Team leadership"]),
    entry("Mentoring", "S7.G.4.2", Soft, &["Mentorship"]),
    entry("Teamwork", "S7.G.5.1", Soft, &["Team player", "Collaboration"]),
    entry("Problem Solving", "S7.G.6.1", Soft, &["Problem-solving"]),
    entry("Project Management", "S7.G.7.1", Soft, &[]),
    // Domains
    entry("FinTech", "S8.H.1.1", Domain, &["Financial technology"]),
    entry("Healthcare", "S8.H.2.1", Domain, &["Health care"]),
    entry("E-commerce", "S8.H.3.1", Domain, &["Ecommerce"]),
    entry("Cybersecurity", "S8.H.4.1", Domain, &["Information security", "InfoSec"]),
    entry("Blockchain", "S8.H.5.1", Domain, &["Web3"]),
];

/// Read-only lookup table over the curated skills.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    entries: Vec<VocabularyEntry>,
    lookup: HashMap<String, usize>,
}

impl SkillVocabulary {
    /// The compiled-in vocabulary.
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_ENTRIES.to_vec())
    }

    /// Builds a vocabulary from arbitrary entries. Earlier entries win alias collisions.
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Self {
        let mut lookup = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for phrase in entry.phrases() {
                lookup.entry(lookup_key(phrase)).or_insert(idx);
            }
        }
        Self { entries, lookup }
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Resolves a canonical name or alias to its entry. Exact lookup, no fuzzy matching.
    pub fn resolve(&self, phrase: &str) -> Option<&VocabularyEntry> {
        self.lookup
            .get(&lookup_key(phrase))
            .map(|&idx| &self.entries[idx])
    }
}

/// Lowercases and treats `-`, `_` and `/` as spaces, so "machine-learning" finds "Machine Learning".
fn lookup_key(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .replace(['-', '_', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
