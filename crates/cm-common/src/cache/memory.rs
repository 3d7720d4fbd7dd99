use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{FastTier, FastTierError, SimilarityEntry};
use crate::normalize::TermPair;

#[derive(Debug, Clone)]
pub struct FastTierConfig {
    /// Entries older than this are treated as absent and dropped on read.
    pub ttl_secs: i64,
    /// Hard entry-count bound; exceeding it evicts oldest entries first.
    pub max_entries: usize,
}

impl Default for FastTierConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 604_800, // one week
            max_entries: 50_000,
        }
    }
}

impl FastTierConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: env_parse("CM_CACHE_TTL_SECS").unwrap_or(defaults.ttl_secs),
            max_entries: env_parse("CM_CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}

/// In-process fast tier: a mutex'd map with lazy TTL expiry and
/// oldest-first eviction once the entry bound is exceeded.
pub struct InMemoryFastTier {
    entries: Mutex<HashMap<TermPair, SimilarityEntry>>,
    config: FastTierConfig,
}

impl InMemoryFastTier {
    pub fn new(config: FastTierConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("fast tier lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, entry: &SimilarityEntry) -> bool {
        Utc::now() - entry.computed_at > Duration::seconds(self.config.ttl_secs)
    }
}

#[async_trait]
impl FastTier for InMemoryFastTier {
    async fn get(&self, pair: &TermPair) -> Result<Option<SimilarityEntry>, FastTierError> {
        let mut entries = self.entries.lock().expect("fast tier lock poisoned");

        match entries.get(pair) {
            Some(entry) if self.expired(entry) => {
                entries.remove(pair);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, entry: SimilarityEntry) -> Result<(), FastTierError> {
        let mut entries = self.entries.lock().expect("fast tier lock poisoned");
        entries.insert(entry.pair.clone(), entry);

        while entries.len() > self.config.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.computed_at)
                .map(|(pair, _)| pair.clone());
            match oldest {
                Some(pair) => entries.remove(&pair),
                None => break,
            };
        }

        Ok(())
    }
}
