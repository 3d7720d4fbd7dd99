pub mod additional;
pub mod aggregate;
pub mod education;
pub mod experience;
pub mod hard_skills;
pub mod languages;
pub mod pipeline;
pub mod sink;
pub mod soft_skills;
pub mod weights;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub use aggregate::{aggregate, MatchResult};
pub use pipeline::{EngineConfig, MatchEngine};
pub use sink::{MatchSink, PostgresMatchSink, SinkError};
pub use weights::{redistribute, BaseWeights, RedistributedWeights};

/// The six axes of candidate/job compatibility. Declaration order is the
/// canonical presentation order for every breakdown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    HardSkills,
    SoftSkills,
    Experience,
    Education,
    Languages,
    Additional,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::HardSkills,
        Dimension::SoftSkills,
        Dimension::Experience,
        Dimension::Education,
        Dimension::Languages,
        Dimension::Additional,
    ];
}

/// Outcome of one dimension scorer.
///
/// `available == false` means the required input was missing on one or both
/// sides; that is not a zero score, it moves the dimension's weight onto
/// the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub score: Option<f64>,
    pub available: bool,
    pub detail: String,
}

impl DimensionScore {
    pub fn scored(dimension: Dimension, score: f64, detail: impl Into<String>) -> Self {
        Self {
            dimension,
            score: Some(score.clamp(0.0, 1.0)),
            available: true,
            detail: detail.into(),
        }
    }

    pub fn unavailable(dimension: Dimension, detail: impl Into<String>) -> Self {
        Self {
            dimension,
            score: None,
            available: false,
            detail: detail.into(),
        }
    }
}

/// Errors a match computation surfaces to its caller. Everything else
/// (provider trouble, cache trouble) degrades internally.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Every dimension lacked input; an overall score would be meaningless.
    #[error("no dimension had usable input for this candidate/job pair")]
    InsufficientData,
    /// Input violated a scorer contract; surfaced instead of defaulted so
    /// upstream data bugs stay visible.
    #[error("malformed attribute: {0}")]
    MalformedAttribute(String),
}

/// Best similarity of `target` against every option, resolved concurrently.
/// Returns the winning option index and its score.
pub(crate) async fn best_match(
    resolver: &crate::resolver::SimilarityResolver,
    options: &[String],
    target: &str,
    kind: crate::provider::PromptKind,
) -> Option<(usize, f64)> {
    if options.is_empty() {
        return None;
    }

    let scores =
        futures::future::join_all(options.iter().map(|option| resolver.resolve(option, target, kind)))
            .await;

    scores
        .into_iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Blend required and preferred sub-scores 70/30; either class alone
/// stands on its own mean.
pub(crate) fn blended_mean(required: &[f64], preferred: &[f64]) -> Option<f64> {
    match (mean(required), mean(preferred)) {
        (Some(req), Some(pref)) => Some(0.7 * req + 0.3 * pref),
        (Some(req), None) => Some(req),
        (None, Some(pref)) => Some(pref),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_covers_every_dimension_once() {
        let mut seen = Dimension::ALL.to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
        assert_eq!(Dimension::ALL[0], Dimension::HardSkills);
        assert_eq!(Dimension::ALL[5], Dimension::Additional);
    }

    #[test]
    fn scored_clamps_into_unit_interval() {
        let result = DimensionScore::scored(Dimension::Experience, 1.4, "over the cap");
        assert_eq!(result.score, Some(1.0));
        assert!(result.available);
    }

    #[test]
    fn blended_mean_handles_partial_classes() {
        assert_eq!(blended_mean(&[1.0], &[0.0]), Some(0.7));
        assert_eq!(blended_mean(&[0.5, 1.0], &[]), Some(0.75));
        assert_eq!(blended_mean(&[], &[0.4]), Some(0.4));
        assert_eq!(blended_mean(&[], &[]), None);
    }
}
