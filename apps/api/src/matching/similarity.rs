use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::embeddings::{cosine_similarity, Embedder};
use crate::skills::models::normalize_skill_name;

/// Cosine similarity above which two skill names are the same skill.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// 0.0 – 1.0
    pub score: f64,
    pub is_match: bool,
}

/// Per-request vector memo. `None` records a failed embedding so it is not retried.
#[derive(Debug, Default)]
pub struct EmbeddingMemo {
    vectors: HashMap<String, Option<Vec<f32>>>,
}

impl EmbeddingMemo {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decides whether two skill names denote the same skill.
#[derive(Clone)]
pub struct SimilarityMatcher {
    embedder: Arc<dyn Embedder>,
    threshold: f64,
}

impl SimilarityMatcher {
    pub fn new(embedder: Arc<dyn Embedder>, threshold: f64) -> Self {
        Self {
            embedder,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn is_match(&self, score: f64) -> bool {
        score > self.threshold
    }

    /// Normalized-equal names score 1.0 without touching the embedder. Otherwise cosine
    /// similarity of the two embeddings, floored at 0. An embedding failure degrades to
    /// exact-only comparison (score 0.0) instead of failing.
    pub async fn compare_memoized(&self, a: &str, b: &str, memo: &mut EmbeddingMemo) -> Similarity {
        let (a, b) = (normalize_skill_name(a), normalize_skill_name(b));
        if a == b {
            return self.similarity(1.0);
        }

        let Some(va) = self.vector(&a, memo).await else {
            return self.similarity(0.0);
        };
        let Some(vb) = self.vector(&b, memo).await else {
            return self.similarity(0.0);
        };
        let score = f64::from(cosine_similarity(&va, &vb)).clamp(0.0, 1.0);
        self.similarity(score)
    }

    fn similarity(&self, score: f64) -> Similarity {
        Similarity {
            score,
            is_match: self.is_match(score),
        }
    }

    async fn vector(&self, text: &str, memo: &mut EmbeddingMemo) -> Option<Vec<f32>> {
        if let Some(cached) = memo.vectors.get(text) {
            return cached.clone();
        }
        let vector = match self.embedder.embed(text).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Embedding failed for '{text}', falling back to exact matching: {e}");
                None
            }
        };
        memo.vectors.insert(text.to_string(), vector.clone());
        vector
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_exact_match_skips_embedder() {
        let embedder = Arc::new(CountingEmbedder::default());
        let matcher = SimilarityMatcher::new(embedder.clone(), DEFAULT_MATCH_THRESHOLD);
        let sim = matcher.compare_memoized("React", "react", &mut EmbeddingMemo::new()).await;
        assert_eq!(sim.score, 1.0);
        assert!(sim.is_match);
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_cosine_path_uses_embeddings() {
        let embedder = Arc::new(FixedEmbedder(vec![
            ("postgresql", vec![1.0, 0.0]),
            ("postgres", vec![0.9, 0.1]),
            ("leadership", vec![0.0, 1.0]),
        ]));
        let matcher = SimilarityMatcher::new(embedder, DEFAULT_MATCH_THRESHOLD);

        let close = matcher.compare_memoized("PostgreSQL", "Postgres", &mut EmbeddingMemo::new()).await;
        assert!(close.score > 0.9 && close.is_match, "{close:?}");

        let far = matcher.compare_memoized("PostgreSQL", "Leadership", &mut EmbeddingMemo::new()).await;
        assert_eq!(far.score, 0.0);
        assert!(!far.is_match);
    }

    #[test]
    fn test_threshold_is_strict() {
        let matcher = SimilarityMatcher::new(Arc::new(FailingEmbedder), 0.7);
        assert!(!matcher.is_match(0.7));
        assert!(matcher.is_match(0.7001));
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_exact_only() {
        let matcher = SimilarityMatcher::new(Arc::new(FailingEmbedder), DEFAULT_MATCH_THRESHOLD);
        assert_eq!(matcher.compare_memoized("Rust", "Golang", &mut EmbeddingMemo::new()).await.score, 0.0);
        assert_eq!(matcher.compare_memoized("Rust", " rust ", &mut EmbeddingMemo::new()).await.score, 1.0);
    }

    #[tokio::test]
    async fn test_memo_embeds_each_text_once() {
        let embedder = Arc::new(CountingEmbedder::default());
        let matcher = SimilarityMatcher::new(embedder.clone(), DEFAULT_MATCH_THRESHOLD);
        let mut memo = EmbeddingMemo::new();
        matcher.compare_memoized("Docker", "Kubernetes", &mut memo).await;
        matcher.compare_memoized("Docker", "Terraform", &mut memo).await;
        assert_eq!(embedder.calls(), 3);
    }
}
