use async_trait::async_trait;

use super::{DurableTier, DurableTierError, DurableTierStats, SimilarityEntry};
use crate::db::{self, DurableCacheConfig, PgPool};
use crate::normalize::TermPair;

/// Durable tier over the `similarity_cache` table.
pub struct PostgresDurableTier {
    pool: PgPool,
    config: DurableCacheConfig,
}

impl PostgresDurableTier {
    pub fn new(pool: PgPool, config: DurableCacheConfig) -> Self {
        Self { pool, config }
    }
}

#[async_trait]
impl DurableTier for PostgresDurableTier {
    async fn get(&self, pair: &TermPair) -> Result<Option<SimilarityEntry>, DurableTierError> {
        db::fetch_similarity(&self.pool, pair)
            .await
            .map_err(|e| DurableTierError::Backend(e.to_string()))
    }

    async fn put(&self, entry: &SimilarityEntry) -> Result<(), DurableTierError> {
        db::upsert_similarity(&self.pool, entry, &self.config)
            .await
            .map_err(|e| DurableTierError::Backend(e.to_string()))
    }

    async fn stats(&self) -> Result<DurableTierStats, DurableTierError> {
        let entries = db::count_entries(&self.pool)
            .await
            .map_err(|e| DurableTierError::Backend(e.to_string()))?;
        Ok(DurableTierStats { entries })
    }
}
