use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::aggregate::{aggregate, MatchResult};
use super::sink::MatchSink;
use super::weights::BaseWeights;
use super::{additional, education, experience, hard_skills, languages, soft_skills, MatchError};
use crate::resolver::SimilarityResolver;
use crate::{CandidateProfile, JobOffer};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// A stored result younger than this is returned as-is instead of
    /// recomputing. Zero disables reuse.
    pub reuse_window_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reuse_window_secs: 86_400,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let reuse_window_secs = std::env::var("CM_MATCH_REUSE_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Self::default().reuse_window_secs);
        Self { reuse_window_secs }
    }
}

/// The match computation engine.
///
/// Constructed once per process and shared; owns the resolver (and through
/// it both cache tiers) instead of reaching for globals, so tests can run
/// any number of engines with substituted providers side by side.
pub struct MatchEngine {
    resolver: Arc<SimilarityResolver>,
    weights: BaseWeights,
    sink: Option<Arc<dyn MatchSink>>,
    config: EngineConfig,
}

impl MatchEngine {
    pub fn new(resolver: Arc<SimilarityResolver>, weights: BaseWeights, config: EngineConfig) -> Self {
        Self {
            resolver,
            weights,
            sink: None,
            config,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn MatchSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Score one candidate against one job.
    ///
    /// The four similarity-driven scorers run concurrently; the two purely
    /// ordinal ones are immediate. The breakdown always comes back in
    /// canonical dimension order, whatever the completion order was.
    /// Persistence failures are logged and absorbed; only
    /// [`MatchError::InsufficientData`] and
    /// [`MatchError::MalformedAttribute`] reach the caller.
    #[instrument(skip_all, fields(candidate_id = candidate.id.as_deref(), job_id = job.id.as_deref()))]
    pub async fn compute_match(
        &self,
        candidate: &CandidateProfile,
        job: &JobOffer,
    ) -> Result<MatchResult, MatchError> {
        if let Some(stored) = self.reusable_stored_result(candidate, job).await {
            return Ok(stored);
        }

        let (hard, soft, experience, education) = tokio::join!(
            hard_skills::score(&self.resolver, candidate, job),
            soft_skills::score(&self.resolver, candidate, job),
            experience::score(&self.resolver, candidate, job),
            education::score(&self.resolver, candidate, job),
        );

        let results = vec![
            hard,
            soft,
            experience?,
            education,
            languages::score(candidate, job),
            additional::score(candidate, job)?,
        ];

        let result = aggregate(&self.weights, results)?;

        if let (Some(candidate_id), Some(job_id), Some(sink)) =
            (candidate.id.as_deref(), job.id.as_deref(), self.sink.as_deref())
        {
            if let Err(err) = sink.store(candidate_id, job_id, &result).await {
                metrics::counter!("cm_match_persist_failures_total").increment(1);
                warn!(error = %err, "failed to persist match result; returning it anyway");
            }
        }

        Ok(result)
    }

    async fn reusable_stored_result(
        &self,
        candidate: &CandidateProfile,
        job: &JobOffer,
    ) -> Option<MatchResult> {
        if self.config.reuse_window_secs <= 0 {
            return None;
        }
        let (candidate_id, job_id, sink) =
            (candidate.id.as_deref()?, job.id.as_deref()?, self.sink.as_deref()?);

        match sink.load(candidate_id, job_id).await {
            Ok(Some(stored)) => {
                let age_secs = (Utc::now() - stored.computed_at).num_seconds();
                if age_secs < self.config.reuse_window_secs {
                    if let Some(result) = stored.result {
                        debug!(age_secs, "reusing stored match result");
                        return Some(result);
                    }
                }
                None
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "stored match lookup failed; recomputing");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::StoredMatch;
    use crate::matching::sink::SinkError;
    use crate::matching::weights::DEFAULT_WEIGHTS;
    use crate::matching::{Dimension, DimensionScore};
    use crate::resolver::test_support::{memory_cache, resolver_with, StubProvider};
    use crate::{
        ExperienceEntry, ExperienceRequirement, Importance, LanguageRequirement, LanguageSkill,
        SkillRequirement,
    };

    fn full_candidate() -> CandidateProfile {
        CandidateProfile {
            id: Some("cand-1".into()),
            experiences: vec![ExperienceEntry {
                title: "full stack developer".into(),
                months: 36,
            }],
            degree: Some("Master in Computer Science".into()),
            hard_skills: vec!["rust".into(), "aws".into()],
            soft_skills: vec!["communication".into()],
            languages: vec![LanguageSkill {
                language: "French".into(),
                level: "native".into(),
            }],
            wants_remote: Some(true),
            min_salary: Some(40_000.0),
        }
    }

    fn full_job() -> JobOffer {
        JobOffer {
            id: Some("job-1".into()),
            title: Some("Backend Developer".into()),
            required_experiences: vec![ExperienceRequirement {
                title: "full stack developer".into(),
                months: 24,
                importance: Importance::Required,
            }],
            required_degree: Some("Bachelor in Computer Science".into()),
            hard_skills: vec![
                SkillRequirement {
                    skill: "Rust".into(),
                    importance: Importance::Required,
                },
                SkillRequirement {
                    skill: "AWS".into(),
                    importance: Importance::Required,
                },
            ],
            soft_skills: vec!["communication".into()],
            languages: vec![LanguageRequirement {
                language: "French".into(),
                level: "advanced".into(),
                importance: Importance::Required,
            }],
            offers_remote: Some(true),
            salary: Some(50_000.0),
        }
    }

    fn engine() -> MatchEngine {
        let resolver = Arc::new(resolver_with(memory_cache(), StubProvider::scoring(0.3)));
        MatchEngine::new(resolver, DEFAULT_WEIGHTS, EngineConfig::default())
    }

    #[derive(Default)]
    struct RecordingSink {
        stored: Mutex<Vec<(String, String, f64)>>,
    }

    #[async_trait]
    impl MatchSink for RecordingSink {
        async fn store(
            &self,
            candidate_id: &str,
            job_id: &str,
            result: &MatchResult,
        ) -> Result<(), SinkError> {
            self.stored.lock().unwrap().push((
                candidate_id.to_string(),
                job_id.to_string(),
                result.final_score,
            ));
            Ok(())
        }

        async fn load(&self, _: &str, _: &str) -> Result<Option<StoredMatch>, SinkError> {
            Ok(None)
        }
    }

    struct FailingSink;

    #[async_trait]
    impl MatchSink for FailingSink {
        async fn store(&self, _: &str, _: &str, _: &MatchResult) -> Result<(), SinkError> {
            Err(SinkError::Backend("durable store down".into()))
        }

        async fn load(&self, _: &str, _: &str) -> Result<Option<StoredMatch>, SinkError> {
            Err(SinkError::Backend("durable store down".into()))
        }
    }

    struct PrimedSink {
        stored: StoredMatch,
    }

    #[async_trait]
    impl MatchSink for PrimedSink {
        async fn store(&self, _: &str, _: &str, _: &MatchResult) -> Result<(), SinkError> {
            Ok(())
        }

        async fn load(&self, _: &str, _: &str) -> Result<Option<StoredMatch>, SinkError> {
            Ok(Some(self.stored.clone()))
        }
    }

    #[tokio::test]
    async fn scores_a_fully_specified_pair() {
        let result = engine()
            .compute_match(&full_candidate(), &full_job())
            .await
            .unwrap();

        assert!(result.final_score > 0.8, "got {}", result.final_score);
        assert!(result.final_score <= 1.0);
        assert!(result.breakdown.iter().all(|r| r.available));

        let order: Vec<Dimension> = result.breakdown.iter().map(|r| r.dimension).collect();
        assert_eq!(order, Dimension::ALL.to_vec());
        assert!((result.weights_used.sum() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn job_without_languages_redistributes_their_weight() {
        let mut job = full_job();
        job.languages.clear();

        let result = engine()
            .compute_match(&full_candidate(), &job)
            .await
            .unwrap();

        let languages = result
            .breakdown
            .iter()
            .find(|r| r.dimension == Dimension::Languages)
            .unwrap();
        assert!(!languages.available);
        assert_eq!(result.weights_used.get(Dimension::Languages), 0.0);
        assert!(
            (result.weights_used.get(Dimension::HardSkills) - 0.40 / 0.90).abs() < 1e-9
        );
        assert!((result.weights_used.sum() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn bare_inputs_are_a_fatal_error() {
        let result = engine()
            .compute_match(&CandidateProfile::default(), &JobOffer::default())
            .await;

        assert!(matches!(result, Err(MatchError::InsufficientData)));
    }

    #[tokio::test]
    async fn malformed_attributes_propagate() {
        let mut candidate = full_candidate();
        candidate.experiences[0].months = -1;

        let result = engine().compute_match(&candidate, &full_job()).await;
        assert!(matches!(result, Err(MatchError::MalformedAttribute(_))));
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_the_result() {
        let resolver = Arc::new(resolver_with(memory_cache(), StubProvider::scoring(0.3)));
        let engine = MatchEngine::new(resolver, DEFAULT_WEIGHTS, EngineConfig::default())
            .with_sink(Arc::new(FailingSink));

        let result = engine.compute_match(&full_candidate(), &full_job()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn results_are_stored_through_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(resolver_with(memory_cache(), StubProvider::scoring(0.3)));
        let engine = MatchEngine::new(resolver, DEFAULT_WEIGHTS, EngineConfig::default())
            .with_sink(sink.clone());

        let result = engine
            .compute_match(&full_candidate(), &full_job())
            .await
            .unwrap();

        let stored = sink.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, "cand-1");
        assert_eq!(stored[0].1, "job-1");
        assert_eq!(stored[0].2, result.final_score);
    }

    #[tokio::test]
    async fn fresh_stored_results_are_reused() {
        let prior = MatchResult {
            final_score: 0.42,
            breakdown: vec![DimensionScore::scored(Dimension::HardSkills, 0.42, "")],
            weights_used: crate::matching::redistribute(
                &DEFAULT_WEIGHTS,
                &[DimensionScore::scored(Dimension::HardSkills, 0.42, "")],
            )
            .unwrap(),
            computed_at: Utc::now(),
        };
        let sink = Arc::new(PrimedSink {
            stored: StoredMatch {
                job_id: "job-1".into(),
                candidate_id: "cand-1".into(),
                final_score: prior.final_score,
                result: Some(prior.clone()),
                computed_at: prior.computed_at,
            },
        });

        let provider = StubProvider::scoring(0.3);
        let resolver = Arc::new(resolver_with(memory_cache(), provider.clone()));
        let engine = MatchEngine::new(resolver, DEFAULT_WEIGHTS, EngineConfig::default())
            .with_sink(sink);

        let result = engine
            .compute_match(&full_candidate(), &full_job())
            .await
            .unwrap();

        assert_eq!(result, prior);
        assert_eq!(provider.call_count(), 0, "reuse must skip all scoring");
    }

    #[tokio::test]
    async fn stale_stored_results_are_recomputed() {
        let stale = StoredMatch {
            job_id: "job-1".into(),
            candidate_id: "cand-1".into(),
            final_score: 0.1,
            result: Some(MatchResult {
                final_score: 0.1,
                breakdown: vec![],
                weights_used: crate::matching::redistribute(
                    &DEFAULT_WEIGHTS,
                    &[DimensionScore::scored(Dimension::HardSkills, 0.1, "")],
                )
                .unwrap(),
                computed_at: Utc::now() - chrono::Duration::days(7),
            }),
            computed_at: Utc::now() - chrono::Duration::days(7),
        };

        let resolver = Arc::new(resolver_with(memory_cache(), StubProvider::scoring(0.3)));
        let engine = MatchEngine::new(resolver, DEFAULT_WEIGHTS, EngineConfig::default())
            .with_sink(Arc::new(PrimedSink { stored: stale }));

        let result = engine
            .compute_match(&full_candidate(), &full_job())
            .await
            .unwrap();
        assert!(result.final_score > 0.5, "stale result must not be reused");
    }
}
