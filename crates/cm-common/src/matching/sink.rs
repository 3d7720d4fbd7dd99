use async_trait::async_trait;
use thiserror::Error;

use super::MatchResult;
use crate::db::{self, PgPool, StoredMatch};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("match persistence error: {0}")]
    Backend(String),
}

/// Durable destination for computed match results. Store failures are
/// logged by the caller; they never invalidate the in-memory result.
#[async_trait]
pub trait MatchSink: Send + Sync {
    async fn store(
        &self,
        candidate_id: &str,
        job_id: &str,
        result: &MatchResult,
    ) -> Result<(), SinkError>;

    async fn load(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Option<StoredMatch>, SinkError>;
}

/// Sink over the `match_results` table.
pub struct PostgresMatchSink {
    pool: PgPool,
}

impl PostgresMatchSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchSink for PostgresMatchSink {
    async fn store(
        &self,
        candidate_id: &str,
        job_id: &str,
        result: &MatchResult,
    ) -> Result<(), SinkError> {
        db::upsert_match_result(&self.pool, job_id, candidate_id, result)
            .await
            .map_err(|e| SinkError::Backend(e.to_string()))
    }

    async fn load(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Option<StoredMatch>, SinkError> {
        db::fetch_match_result(&self.pool, job_id, candidate_id)
            .await
            .map_err(|e| SinkError::Backend(e.to_string()))
    }
}
