use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::cache::{ScoreSource, SimilarityEntry};
use crate::db::PgPool;
use crate::normalize::{normalize, TermPair};

#[derive(Debug, thiserror::Error)]
pub enum SimilarityCacheError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

#[derive(Debug, Clone)]
pub struct DurableCacheConfig {
    /// Entry bound; upserts above it trim the oldest tenth of the table.
    pub max_entries: i64,
}

impl Default for DurableCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
        }
    }
}

impl DurableCacheConfig {
    pub fn from_env() -> Self {
        let max_entries = std::env::var("CM_DURABLE_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Self::default().max_entries);
        Self { max_entries }
    }
}

/// Look up a stored similarity by canonical pair.
#[instrument(skip(pool))]
pub async fn fetch_similarity(
    pool: &PgPool,
    pair: &TermPair,
) -> Result<Option<SimilarityEntry>, SimilarityCacheError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "SELECT score, source, computed_at
             FROM similarity_cache
             WHERE term_a = $1 AND term_b = $2",
        )
        .await?;

    let row = client
        .query_opt(&stmt, &[&pair.first().as_str(), &pair.second().as_str()])
        .await?;

    Ok(row.map(|row| {
        let score: f64 = row.get(0);
        let source: String = row.get(1);
        let computed_at: DateTime<Utc> = row.get(2);
        SimilarityEntry {
            pair: pair.clone(),
            score,
            computed_at,
            source: source.parse().unwrap_or(ScoreSource::Provider),
        }
    }))
}

/// Upsert a similarity entry, trimming the oldest tenth of the table once
/// the configured entry bound is reached.
#[instrument(skip(pool, entry), fields(term_a = %entry.pair.first(), term_b = %entry.pair.second()))]
pub async fn upsert_similarity(
    pool: &PgPool,
    entry: &SimilarityEntry,
    config: &DurableCacheConfig,
) -> Result<(), SimilarityCacheError> {
    let client = pool.get().await?;

    let count_stmt = client
        .prepare("SELECT COUNT(*) FROM similarity_cache")
        .await?;
    let count: i64 = client.query_one(&count_stmt, &[]).await?.get(0);

    if count >= config.max_entries {
        let trim = (config.max_entries / 10).max(1);
        let trim_stmt = client
            .prepare(
                "DELETE FROM similarity_cache
                 WHERE (term_a, term_b) IN (
                     SELECT term_a, term_b FROM similarity_cache
                     ORDER BY computed_at ASC
                     LIMIT $1
                 )",
            )
            .await?;
        client.execute(&trim_stmt, &[&trim]).await?;
    }

    let stmt = client
        .prepare(
            "INSERT INTO similarity_cache (term_a, term_b, score, source, computed_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (term_a, term_b) DO UPDATE SET
                 score = EXCLUDED.score,
                 source = EXCLUDED.source,
                 computed_at = EXCLUDED.computed_at",
        )
        .await?;

    client
        .execute(
            &stmt,
            &[
                &entry.pair.first().as_str(),
                &entry.pair.second().as_str(),
                &entry.score,
                &entry.source.to_string(),
                &entry.computed_at,
            ],
        )
        .await?;

    Ok(())
}

/// Current entry count, for the cache statistics surface.
pub async fn count_entries(pool: &PgPool) -> Result<i64, SimilarityCacheError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare("SELECT COUNT(*) FROM similarity_cache")
        .await?;
    Ok(client.query_one(&stmt, &[]).await?.get(0))
}

/// Page through stored similarities, newest first (operational tooling).
pub async fn list_entries(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<SimilarityEntry>, SimilarityCacheError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "SELECT term_a, term_b, score, source, computed_at
             FROM similarity_cache
             ORDER BY computed_at DESC
             LIMIT $1 OFFSET $2",
        )
        .await?;

    let rows = client.query(&stmt, &[&limit, &offset]).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let term_a: String = row.get(0);
            let term_b: String = row.get(1);
            let score: f64 = row.get(2);
            let source: String = row.get(3);
            let computed_at: DateTime<Utc> = row.get(4);
            SimilarityEntry {
                pair: TermPair::new(normalize(&term_a), normalize(&term_b)),
                score,
                computed_at,
                source: source.parse().unwrap_or(ScoreSource::Provider),
            }
        })
        .collect())
}
