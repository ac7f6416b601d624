use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const REQUIRED_TABLES: [&str; 2] = ["skill_profiles", "skill_audit_logs"];

/// Creates a PostgreSQL connection pool and checks that the schema from
/// `migrations/` has been applied.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    ensure_schema(&pool).await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for table in REQUIRED_TABLES {
        let (present,): (bool,) =
            sqlx::query_as("SELECT to_regclass($1) IS NOT NULL")
                .bind(format!("public.{table}"))
                .fetch_one(pool)
                .await?;
        if !present {
            anyhow::bail!(
                "Table '{table}' is missing; apply migrations/0001_skill_profiles.sql first"
            );
        }
    }
    Ok(())
}
