use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use serde_json::Value;
use tokio_postgres::types::Json;
use tokio_postgres::Error as PgError;
use tracing::{instrument, warn};

use crate::db::PgPool;
use crate::matching::MatchResult;

#[derive(Debug, thiserror::Error)]
pub enum MatchResultStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to encode match result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A match score as read back from storage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredMatch {
    pub job_id: String,
    pub candidate_id: String,
    pub final_score: f64,
    pub result: Option<MatchResult>,
    pub computed_at: DateTime<Utc>,
}

/// Upsert the score and full breakdown for a (job, candidate) pair.
#[instrument(skip(pool, result))]
pub async fn upsert_match_result(
    pool: &PgPool,
    job_id: &str,
    candidate_id: &str,
    result: &MatchResult,
) -> Result<(), MatchResultStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "INSERT INTO match_results (job_id, candidate_id, final_score, breakdown, computed_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (job_id, candidate_id) DO UPDATE SET
                 final_score = EXCLUDED.final_score,
                 breakdown = EXCLUDED.breakdown,
                 computed_at = EXCLUDED.computed_at",
        )
        .await?;

    let breakdown = serde_json::to_value(result)?;
    client
        .execute(
            &stmt,
            &[
                &job_id,
                &candidate_id,
                &result.final_score,
                &Json(&breakdown),
                &result.computed_at,
            ],
        )
        .await?;

    Ok(())
}

/// Fetch one stored match, if present.
#[instrument(skip(pool))]
pub async fn fetch_match_result(
    pool: &PgPool,
    job_id: &str,
    candidate_id: &str,
) -> Result<Option<StoredMatch>, MatchResultStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "SELECT job_id, candidate_id, final_score, breakdown, computed_at
             FROM match_results
             WHERE job_id = $1 AND candidate_id = $2",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&job_id, &candidate_id]).await?;
    Ok(row.map(row_to_stored_match))
}

/// Best stored matches for a job, highest score first.
#[instrument(skip(pool))]
pub async fn fetch_top_matches_for_job(
    pool: &PgPool,
    job_id: &str,
    limit: i64,
) -> Result<Vec<StoredMatch>, MatchResultStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "SELECT job_id, candidate_id, final_score, breakdown, computed_at
             FROM match_results
             WHERE job_id = $1
             ORDER BY final_score DESC
             LIMIT $2",
        )
        .await?;

    let rows = client.query(&stmt, &[&job_id, &limit]).await?;
    Ok(rows.into_iter().map(row_to_stored_match).collect())
}

fn row_to_stored_match(row: tokio_postgres::Row) -> StoredMatch {
    let Json(breakdown): Json<Value> = row.get(3);
    let result = match serde_json::from_value(breakdown) {
        Ok(result) => Some(result),
        Err(err) => {
            // Rows written by an older engine version stay readable; the
            // caller just loses the per-dimension detail.
            warn!(error = %err, "stored breakdown no longer decodes");
            None
        }
    };

    StoredMatch {
        job_id: row.get(0),
        candidate_id: row.get(1),
        final_score: row.get(2),
        result,
        computed_at: row.get(4),
    }
}
