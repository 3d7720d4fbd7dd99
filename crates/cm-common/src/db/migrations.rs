use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::info;

use crate::db::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS similarity_cache (
        term_a TEXT NOT NULL,
        term_b TEXT NOT NULL,
        score DOUBLE PRECISION NOT NULL,
        source TEXT NOT NULL,
        computed_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (term_a, term_b)
    )",
    "CREATE INDEX IF NOT EXISTS idx_similarity_cache_computed_at
        ON similarity_cache (computed_at)",
    "CREATE TABLE IF NOT EXISTS match_results (
        job_id TEXT NOT NULL,
        candidate_id TEXT NOT NULL,
        final_score DOUBLE PRECISION NOT NULL,
        breakdown JSONB NOT NULL,
        computed_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (job_id, candidate_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_match_results_job_score
        ON match_results (job_id, final_score DESC)",
];

/// Create the similarity cache and match result tables if missing.
/// Idempotent; runs at service startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let client = pool.get().await?;
    for statement in SCHEMA {
        client.batch_execute(statement).await?;
    }
    info!("database schema ready");
    Ok(())
}
