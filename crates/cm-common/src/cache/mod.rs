pub mod memory;
pub mod postgres;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::normalize::TermPair;

pub use memory::{FastTierConfig, InMemoryFastTier};
pub use postgres::PostgresDurableTier;

/// Which layer produced a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    KnowledgeBase,
    Cache,
    Provider,
}

/// A resolved similarity for one canonical term pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEntry {
    pub pair: TermPair,
    pub score: f64,
    pub computed_at: DateTime<Utc>,
    pub source: ScoreSource,
}

impl SimilarityEntry {
    pub fn new(pair: TermPair, score: f64, source: ScoreSource) -> Self {
        Self {
            pair,
            score,
            computed_at: Utc::now(),
            source,
        }
    }
}

/// The fast tier can be a remote process; "unreachable" must stay
/// distinguishable from "key not found".
#[derive(Debug, Error)]
pub enum FastTierError {
    #[error("fast cache tier unreachable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Error)]
pub enum DurableTierError {
    #[error("durable cache tier error: {0}")]
    Backend(String),
}

/// Low-latency, volatile cache tier with TTL expiry and a capacity bound.
#[async_trait]
pub trait FastTier: Send + Sync {
    async fn get(&self, pair: &TermPair) -> Result<Option<SimilarityEntry>, FastTierError>;
    async fn put(&self, entry: SimilarityEntry) -> Result<(), FastTierError>;
}

/// Persistent cache tier. No TTL; entries survive process restarts.
#[async_trait]
pub trait DurableTier: Send + Sync {
    async fn get(&self, pair: &TermPair) -> Result<Option<SimilarityEntry>, DurableTierError>;
    async fn put(&self, entry: &SimilarityEntry) -> Result<(), DurableTierError>;
    async fn stats(&self) -> Result<DurableTierStats, DurableTierError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DurableTierStats {
    pub entries: i64,
}

/// Process-local lookup counters, exposed through [`SimilarityCache::stats`].
#[derive(Debug, Default)]
struct Counters {
    fast_hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    fast_errors: AtomicU64,
    durable_errors: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub fast_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub fast_errors: u64,
    pub durable_errors: u64,
    pub durable: DurableTierStats,
}

/// Ceiling on one durable-tier round trip; a slow store degrades to a
/// miss instead of stalling the resolution.
const DURABLE_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Two-tier similarity cache.
///
/// Reads check the fast tier first and fall back to the durable tier,
/// repopulating the fast tier on a durable hit. Writes go to both tiers.
/// A fast tier that reports [`FastTierError::Unreachable`] is skipped
/// silently on both paths: degraded lookups are slower, never failed.
pub struct SimilarityCache {
    fast: Arc<dyn FastTier>,
    durable: Arc<dyn DurableTier>,
    counters: Counters,
}

async fn bounded<T>(
    op: impl std::future::Future<Output = Result<T, DurableTierError>>,
) -> Result<T, DurableTierError> {
    match timeout(DURABLE_OP_TIMEOUT, op).await {
        Ok(result) => result,
        Err(_) => Err(DurableTierError::Backend("operation timed out".into())),
    }
}

impl SimilarityCache {
    pub fn new(fast: Arc<dyn FastTier>, durable: Arc<dyn DurableTier>) -> Self {
        Self {
            fast,
            durable,
            counters: Counters::default(),
        }
    }

    pub async fn get(&self, pair: &TermPair) -> Option<SimilarityEntry> {
        match self.fast.get(pair).await {
            Ok(Some(entry)) => {
                self.counters.fast_hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cm_cache_fast_hits_total").increment(1);
                return Some(entry);
            }
            Ok(None) => {}
            Err(err) => {
                self.counters.fast_errors.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cm_cache_fast_errors_total").increment(1);
                debug!(error = %err, "fast tier read failed; falling back to durable tier");
            }
        }

        match bounded(self.durable.get(pair)).await {
            Ok(Some(entry)) => {
                self.counters.durable_hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cm_cache_durable_hits_total").increment(1);
                // Write-through so the next lookup is served from the fast tier.
                if let Err(err) = self.fast.put(entry.clone()).await {
                    debug!(error = %err, "fast tier repopulation skipped");
                }
                Some(entry)
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cm_cache_misses_total").increment(1);
                None
            }
            Err(err) => {
                self.counters.durable_errors.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cm_cache_durable_errors_total").increment(1);
                warn!(error = %err, "durable tier read failed; treating as miss");
                None
            }
        }
    }

    /// Store an entry in both tiers. Tier failures are logged and absorbed:
    /// losing a cache write must not fail the similarity resolution that
    /// produced it.
    pub async fn put(&self, entry: SimilarityEntry) {
        if let Err(err) = self.fast.put(entry.clone()).await {
            self.counters.fast_errors.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("cm_cache_fast_errors_total").increment(1);
            debug!(error = %err, "fast tier write skipped");
        }

        if let Err(err) = bounded(self.durable.put(&entry)).await {
            self.counters.durable_errors.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("cm_cache_durable_errors_total").increment(1);
            warn!(error = %err, "durable tier write failed");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let durable = match bounded(self.durable.stats()).await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "durable tier stats unavailable");
                DurableTierStats::default()
            }
        };

        CacheStats {
            fast_hits: self.counters.fast_hits.load(Ordering::Relaxed),
            durable_hits: self.counters.durable_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            fast_errors: self.counters.fast_errors.load(Ordering::Relaxed),
            durable_errors: self.counters.durable_errors.load(Ordering::Relaxed),
            durable,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Durable tier over a plain map, for exercising the cache without
    /// a database.
    #[derive(Default)]
    pub struct MapDurableTier {
        entries: Mutex<HashMap<TermPair, SimilarityEntry>>,
    }

    #[async_trait]
    impl DurableTier for MapDurableTier {
        async fn get(&self, pair: &TermPair) -> Result<Option<SimilarityEntry>, DurableTierError> {
            Ok(self.entries.lock().unwrap().get(pair).cloned())
        }

        async fn put(&self, entry: &SimilarityEntry) -> Result<(), DurableTierError> {
            self.entries
                .lock()
                .unwrap()
                .insert(entry.pair.clone(), entry.clone());
            Ok(())
        }

        async fn stats(&self) -> Result<DurableTierStats, DurableTierError> {
            Ok(DurableTierStats {
                entries: self.entries.lock().unwrap().len() as i64,
            })
        }
    }

    /// Fast tier that is partitioned away: every operation errors.
    pub struct UnreachableFastTier;

    #[async_trait]
    impl FastTier for UnreachableFastTier {
        async fn get(&self, _pair: &TermPair) -> Result<Option<SimilarityEntry>, FastTierError> {
            Err(FastTierError::Unreachable("connection refused".into()))
        }

        async fn put(&self, _entry: SimilarityEntry) -> Result<(), FastTierError> {
            Err(FastTierError::Unreachable("connection refused".into()))
        }
    }
}
