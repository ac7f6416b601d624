//! FNV-1a character n-gram feature hashing. Deterministic, offline, no model download.
//!
//! Spelling variants share n-grams and land close together. There is no notion of
//! meaning, so synonyms with no shared n-grams score low.

use async_trait::async_trait;

use super::{EmbedError, Embedder};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

pub const DEFAULT_DIMENSION: usize = 256;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    ngram_range: (usize, usize),
    model: String,
}

impl HashEmbedder {
    /// A zero dimension is bumped to 1.
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            ngram_range: (2, 4),
            model: format!("fnv1a-ngram-{dimension}"),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        // Pad with spaces so word starts and ends form their own n-grams
        let padded = format!(" {} ", text.trim().to_lowercase());
        let chars: Vec<char> = padded.chars().collect();
        if chars.len() <= 2 {
            return vector;
        }
        for n in self.ngram_range.0..=self.ngram_range.1 {
            for window in chars.windows(n) {
                let ngram: String = window.iter().collect();
                let h = fnv1a(ngram.as_bytes());
                let bucket = (h % self.dimension as u64) as usize;
                let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
            }
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.vector(text))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[tokio::test]
    async fn test_unit_length() {
        let v = HashEmbedder::new(64).embed("kubernetes").await.unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_deterministic_and_case_insensitive() {
        let e = HashEmbedder::default();
        assert_eq!(e.embed("React").await.unwrap(), e.embed("react").await.unwrap());
    }

    #[tokio::test]
    async fn test_related_names_score_higher_than_unrelated() {
        let e = HashEmbedder::default();
        let postgres = e.embed("PostgreSQL").await.unwrap();
        let postgres_db = e.embed("PostgreSQL database").await.unwrap();
        let leadership = e.embed("Leadership").await.unwrap();
        assert!(
            cosine_similarity(&postgres, &postgres_db) > cosine_similarity(&postgres, &leadership)
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let v = HashEmbedder::new(16).embed("   ").await.unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
