use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::matching::job_match::JobMatchEngine;
use crate::matching::similarity::SimilarityMatcher;
use crate::skills::extraction::SkillExtractionEngine;
use crate::skills::store::ProfileStore;
use crate::skills::vocabulary::SkillVocabulary;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable profile persistence. Default: PgProfileStore; tests use InMemoryProfileStore.
    pub store: Arc<dyn ProfileStore>,
    pub extraction: Arc<SkillExtractionEngine>,
    pub job_matcher: JobMatchEngine,
    pub config: Config,
}

impl AppState {
    /// Builds the engines around the compiled-in vocabulary. Extraction and job
    /// matching share one detector so résumé and job skills resolve identically.
    pub fn new(
        config: Config,
        store: Arc<dyn ProfileStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, AppError> {
        let vocabulary = Arc::new(SkillVocabulary::builtin());
        let extraction = Arc::new(SkillExtractionEngine::new(vocabulary, store.clone())?);
        let job_matcher = JobMatchEngine::new(
            extraction.detector().clone(),
            extraction.mapper().clone(),
            SimilarityMatcher::new(embedder, config.match_threshold),
        );
        Ok(Self {
            store,
            extraction,
            job_matcher,
            config,
        })
    }
}
