//! Embedding collaborators: text → fixed-length vector.
//!
//! The matching core only sees `Arc<dyn Embedder>`. Which backend sits behind it
//! (remote API, local hashing, Redis-cached) is decided once at startup.

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod hash;
pub mod remote;

pub use cache::CachedEmbedder;
pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Embedding API returned no vectors")]
    EmptyResponse,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifies the vector space. Vectors from different models are not comparable.
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Cosine similarity in `[-1, 1]`. Mismatched lengths and zero vectors give 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
