use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::cache::{ScoreSource, SimilarityCache, SimilarityEntry};
use crate::knowledge;
use crate::normalize::TermPair;
use crate::provider::{PromptKind, ProviderError, SimilarityProvider};

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Returned when the provider fails or times out. A single unresolved
    /// term pair must not fail a whole match computation.
    pub neutral_score: f64,
    /// Deadline for one provider call; exceeding it counts as failure.
    pub provider_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            neutral_score: 0.5,
            provider_timeout: Duration::from_secs(8),
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let neutral_score = std::env::var("CM_NEUTRAL_SIMILARITY")
            .ok()
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(defaults.neutral_score);
        let provider_timeout = std::env::var("CM_PROVIDER_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.provider_timeout);
        Self {
            neutral_score,
            provider_timeout,
        }
    }
}

/// Resolves the semantic similarity of two raw terms.
///
/// Layer order: exact match after normalization, curated knowledge base,
/// two-tier cache, external provider. The provider is the only
/// non-deterministic layer and the only one allowed to fail; its failures
/// degrade to [`ResolverConfig::neutral_score`].
///
/// Safe for concurrent use; concurrent writes for one pair are idempotent
/// (last write wins, values for a given pair are deterministic).
pub struct SimilarityResolver {
    cache: Arc<SimilarityCache>,
    provider: Arc<dyn SimilarityProvider>,
    config: ResolverConfig,
}

impl SimilarityResolver {
    pub fn new(
        cache: Arc<SimilarityCache>,
        provider: Arc<dyn SimilarityProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            config,
        }
    }

    pub fn neutral_score(&self) -> f64 {
        self.config.neutral_score
    }

    /// Similarity in [0, 1] for two raw terms. Infallible: provider and
    /// cache failures degrade instead of propagating.
    pub async fn resolve(&self, raw_a: &str, raw_b: &str, kind: PromptKind) -> f64 {
        let pair = TermPair::from_raw(raw_a, raw_b);

        if pair.has_empty_side() {
            return 0.0;
        }
        if pair.identical() {
            return 1.0;
        }

        if let Some(score) = knowledge::lookup_relation(&pair) {
            metrics::counter!("cm_resolver_knowledge_hits_total").increment(1);
            // Written through for the operational cache views; reads never
            // depend on it because the knowledge base is consulted first.
            self.cache
                .put(SimilarityEntry::new(pair, score, ScoreSource::KnowledgeBase))
                .await;
            return score;
        }

        if let Some(entry) = self.cache.get(&pair).await {
            return entry.score;
        }

        self.resolve_via_provider(pair, kind).await
    }

    /// Call the provider on a detached task so that caller cancellation
    /// never aborts an in-flight call: a late success still lands in the
    /// cache where the next request picks it up. The timeout lives inside
    /// the task, so a timed-out call is a failure and is never cached.
    async fn resolve_via_provider(&self, pair: TermPair, kind: PromptKind) -> f64 {
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let deadline = self.config.provider_timeout;

        let handle = tokio::spawn(async move {
            let a = pair.first().as_str().to_string();
            let b = pair.second().as_str().to_string();

            let score = match timeout(deadline, provider.similarity(&a, &b, kind)).await {
                Ok(Ok(score)) => score.clamp(0.0, 1.0),
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(ProviderError::Timeout),
            };

            cache
                .put(SimilarityEntry::new(pair, score, ScoreSource::Provider))
                .await;
            Ok(score)
        });

        match handle.await {
            Ok(Ok(score)) => {
                metrics::counter!("cm_resolver_provider_hits_total").increment(1);
                score
            }
            Ok(Err(err)) => {
                metrics::counter!("cm_resolver_provider_failures_total").increment(1);
                warn!(error = %err, neutral = self.config.neutral_score, "provider failed; using neutral similarity");
                self.config.neutral_score
            }
            Err(err) => {
                metrics::counter!("cm_resolver_provider_failures_total").increment(1);
                warn!(error = %err, "provider task aborted; using neutral similarity");
                self.config.neutral_score
            }
        }
    }
}
