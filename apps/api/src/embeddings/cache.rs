use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use super::{EmbedError, Embedder};

/// Read-through Redis cache in front of another embedder.
///
/// Cache failures are logged and fall through to the inner embedder; they never fail a call.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, conn: MultiplexedConnection, ttl_secs: u64) -> Self {
        Self {
            inner,
            conn,
            ttl_secs,
        }
    }

    async fn lookup(&self, key: &str) -> Option<Vec<f32>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = match redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!("Embedding cache read failed for {key}: {e}");
                return None;
            }
        };
        cached.and_then(|raw| decode_vector(&raw))
    }

    async fn store(&self, key: &str, vector: &[f32]) {
        let Some(payload) = encode_vector(vector) else {
            return;
        };
        let mut conn = self.conn.clone();
        let result = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await;
        if let Err(e) = result {
            warn!("Embedding cache write failed for {key}: {e}");
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let key = cache_key(self.inner.model(), text);
        if let Some(hit) = self.lookup(&key).await {
            debug!("Embedding cache hit: {key}");
            return Ok(hit);
        }
        let vector = self.inner.embed(text).await?;
        self.store(&key, &vector).await;
        Ok(vector)
    }
}

/// `emb:{model}:{normalized text}`. Skill names are short, so the text is kept readable.
pub fn cache_key(model: &str, text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("emb:{model}:{normalized}")
}

fn encode_vector(vector: &[f32]) -> Option<String> {
    serde_json::to_string(vector).ok()
}

fn decode_vector(raw: &str) -> Option<Vec<f32>> {
    serde_json::from_str::<Vec<f32>>(raw)
        .ok()
        .filter(|v| !v.is_empty())
}
