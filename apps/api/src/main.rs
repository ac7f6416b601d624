mod config;
mod db;
mod embeddings;
mod errors;
mod export;
mod matching;
mod models;
mod routes;
mod skills;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::embeddings::{CachedEmbedder, Embedder, HashEmbedder, RemoteEmbedder};
use crate::routes::build_router;
use crate::skills::store::{InMemoryProfileStore, PgProfileStore, ProfileStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SkillSense API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize profile storage
    let store: Arc<dyn ProfileStore> = match config.database_url.as_deref() {
        Some(url) => Arc::new(PgProfileStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set, profiles are kept in memory and lost on restart");
            Arc::new(InMemoryProfileStore::new())
        }
    };

    // Initialize embeddings (remote when a key is configured, Redis cache when available)
    let embedder = build_embedder(&config).await?;
    info!(
        "Embedder initialized (model: {}, match threshold: {})",
        embedder.model(),
        config.match_threshold
    );

    // Build app state
    let state = AppState::new(config.clone(), store, embedder)?;

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let base: Arc<dyn Embedder> = match &config.embedding_api_key {
        Some(key) => Arc::new(RemoteEmbedder::new(
            key.clone(),
            config.embedding_api_url.clone(),
            config.embedding_model.clone(),
        )?),
        None => {
            info!("EMBEDDING_API_KEY not set, using local hash embedder");
            Arc::new(HashEmbedder::default())
        }
    };

    let Some(redis_url) = config.redis_url.as_deref() else {
        return Ok(base);
    };

    let connection = match redis::Client::open(redis_url) {
        Ok(client) => client.get_multiplexed_async_connection().await,
        Err(e) => Err(e),
    };
    match connection {
        Ok(conn) => {
            info!(
                "Redis embedding cache enabled (ttl {}s)",
                config.embedding_cache_ttl_secs
            );
            Ok(Arc::new(CachedEmbedder::new(
                base,
                conn,
                config.embedding_cache_ttl_secs,
            )))
        }
        Err(e) => {
            warn!("Redis unavailable, continuing without embedding cache: {e}");
            Ok(base)
        }
    }
}
