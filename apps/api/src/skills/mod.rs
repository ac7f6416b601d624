// Skill extraction: vocabulary-driven detection, evidence scoring, confidence
// aggregation, taxonomy mapping, GitHub enrichment and manual curation.
// Everything except the store and the handlers is synchronous and pure.

pub mod confidence;
pub mod detector;
pub mod evidence;
pub mod extraction;
pub mod github;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod store;
pub mod taxonomy;
pub mod vocabulary;
