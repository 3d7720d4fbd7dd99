use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::weights::{redistribute, BaseWeights, RedistributedWeights};
use super::{Dimension, DimensionScore, MatchError};

/// Final outcome of one candidate/job match computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub final_score: f64,
    /// Always presented in [`Dimension::ALL`] order, regardless of which
    /// scorer finished first.
    pub breakdown: Vec<DimensionScore>,
    pub weights_used: RedistributedWeights,
    pub computed_at: DateTime<Utc>,
}

/// Combine dimension results into a final weighted score.
///
/// Unavailable dimensions contribute no score; their weight mass has
/// already moved onto the available ones. With every dimension unavailable
/// this is an input error, never a silent zero.
pub fn aggregate(
    base: &BaseWeights,
    mut results: Vec<DimensionScore>,
) -> Result<MatchResult, MatchError> {
    let weights = redistribute(base, &results)?;

    let final_score: f64 = results
        .iter()
        .filter_map(|result| {
            result
                .score
                .map(|score| score * weights.get(result.dimension))
        })
        .sum();

    let weight_sum = weights.sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
        warn!(weight_sum, "redistributed weights drifted off 1.0");
    }

    results.sort_by_key(|result| {
        Dimension::ALL
            .iter()
            .position(|d| *d == result.dimension)
            .unwrap_or(Dimension::ALL.len())
    });

    Ok(MatchResult {
        final_score: final_score.clamp(0.0, 1.0),
        breakdown: results,
        weights_used: weights,
        computed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    fn scored(dimension: Dimension, score: f64) -> DimensionScore {
        DimensionScore::scored(dimension, score, "")
    }

    #[test]
    fn weighted_sum_over_all_dimensions() {
        let results = vec![
            scored(Dimension::HardSkills, 1.0),
            scored(Dimension::SoftSkills, 0.5),
            scored(Dimension::Experience, 0.8),
            scored(Dimension::Education, 1.0),
            scored(Dimension::Languages, 0.6),
            scored(Dimension::Additional, 1.0),
        ];

        let result = aggregate(&DEFAULT_WEIGHTS, results).unwrap();
        let expected =
            0.40 * 1.0 + 0.10 * 0.5 + 0.20 * 0.8 + 0.15 * 1.0 + 0.10 * 0.6 + 0.05 * 1.0;
        assert!((result.final_score - expected).abs() < 1e-9);
    }

    #[test]
    fn breakdown_is_reordered_canonically() {
        let results = vec![
            scored(Dimension::Additional, 1.0),
            scored(Dimension::HardSkills, 1.0),
            DimensionScore::unavailable(Dimension::Languages, ""),
            scored(Dimension::Education, 1.0),
            scored(Dimension::SoftSkills, 1.0),
            scored(Dimension::Experience, 1.0),
        ];

        let result = aggregate(&DEFAULT_WEIGHTS, results).unwrap();
        let order: Vec<Dimension> = result.breakdown.iter().map(|r| r.dimension).collect();
        assert_eq!(order, Dimension::ALL.to_vec());
    }

    #[test]
    fn unavailable_dimension_contributes_nothing_but_weight_moves() {
        let results = vec![
            scored(Dimension::HardSkills, 1.0),
            DimensionScore::unavailable(Dimension::Languages, ""),
        ];

        let result = aggregate(&DEFAULT_WEIGHTS, results).unwrap();
        // hard skills carry the whole mass: 0.40/0.40 = 1.0.
        assert_eq!(result.final_score, 1.0);
        assert_eq!(result.weights_used.get(Dimension::Languages), 0.0);
    }

    #[test]
    fn all_unavailable_raises_instead_of_scoring_zero() {
        let results: Vec<_> = Dimension::ALL
            .into_iter()
            .map(|d| DimensionScore::unavailable(d, ""))
            .collect();

        assert!(matches!(
            aggregate(&DEFAULT_WEIGHTS, results),
            Err(MatchError::InsufficientData)
        ));
    }

    #[test]
    fn result_round_trips_through_json() {
        let results = vec![
            scored(Dimension::HardSkills, 0.9),
            DimensionScore::unavailable(Dimension::Languages, "not applicable"),
        ];
        let result = aggregate(&DEFAULT_WEIGHTS, results).unwrap();

        let encoded = serde_json::to_value(&result).unwrap();
        let decoded: MatchResult = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, result);
    }
}
