//! HTTP embeddings client for OpenAI/Voyage-style `POST {base}/embeddings` endpoints.
//!
//! Retries on 429 and 5xx with exponential backoff. Callers above this module never retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EmbedError, Embedder};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl RemoteEmbedder {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, EmbedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let mut last_error: Option<EmbedError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, then 1s
                let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbedError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbedError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(EmbedError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: EmbeddingResponse = response.json().await?;
            let vector = parsed
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .filter(|v| !v.is_empty())
                .ok_or(EmbedError::EmptyResponse)?;

            debug!("Embedded {} chars into {} dims", text.len(), vector.len());
            return Ok(vector);
        }

        Err(last_error.unwrap_or(EmbedError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}
