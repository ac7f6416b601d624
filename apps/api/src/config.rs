use anyhow::{Context, Result};

use crate::matching::similarity::DEFAULT_MATCH_THRESHOLD;

/// Default number of missing skills returned by a job match.
pub const DEFAULT_TOP_K: usize = 10;

/// Largest `top_k` a job match accepts.
pub const MAX_TOP_K: usize = 50;

const DEFAULT_EMBEDDING_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is set but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Without it profiles live in process memory and are lost on restart.
    pub database_url: Option<String>,
    /// Enables the Redis embedding cache when set.
    pub redis_url: Option<String>,
    pub embedding_api_url: Option<String>,
    /// Without a key the local hash embedder is used.
    pub embedding_api_key: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_cache_ttl_secs: u64,
    /// Cosine similarity above which two skill names count as the same skill.
    pub match_threshold: f64,
    pub default_top_k: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_threshold = parse_env("MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)?;
        if !(0.0..=1.0).contains(&match_threshold) {
            anyhow::bail!("MATCH_THRESHOLD must be within 0.0..=1.0, got {match_threshold}");
        }

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            embedding_model: optional_env("EMBEDDING_MODEL"),
            embedding_cache_ttl_secs: parse_env(
                "EMBEDDING_CACHE_TTL_SECS",
                DEFAULT_EMBEDDING_CACHE_TTL_SECS,
            )?,
            match_threshold,
            default_top_k: check_top_k(parse_env("DEFAULT_TOP_K", DEFAULT_TOP_K)?)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn check_top_k(top_k: usize) -> Result<usize> {
    if !(1..=MAX_TOP_K).contains(&top_k) {
        anyhow::bail!("DEFAULT_TOP_K must be within 1..={MAX_TOP_K}, got {top_k}");
    }
    Ok(top_k)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
