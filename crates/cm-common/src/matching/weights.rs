use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Dimension, DimensionScore, MatchError};

/// Configured default weights. Technical skills dominate; the logistics
/// bucket (remote/salary) carries the small remainder.
pub const DEFAULT_WEIGHTS: BaseWeights = BaseWeights {
    hard_skills: 0.40,
    soft_skills: 0.10,
    experience: 0.20,
    education: 0.15,
    languages: 0.10,
    additional: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub hard_skills: f64,
    pub soft_skills: f64,
    pub experience: f64,
    pub education: f64,
    pub languages: f64,
    pub additional: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl BaseWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::HardSkills => self.hard_skills,
            Dimension::SoftSkills => self.soft_skills,
            Dimension::Experience => self.experience,
            Dimension::Education => self.education,
            Dimension::Languages => self.languages,
            Dimension::Additional => self.additional,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }
}

/// Per-match weights after moving unavailable dimensions' mass onto the
/// available ones. Sums to 1.0 whenever at least one dimension is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributedWeights(BTreeMap<Dimension, f64>);

impl RedistributedWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }
}

/// Reallocate the base weights over the available dimensions,
/// proportionally to their base mass. All dimensions unavailable is a
/// fatal input error, not a zero score.
pub fn redistribute(
    base: &BaseWeights,
    results: &[DimensionScore],
) -> Result<RedistributedWeights, MatchError> {
    let available: Vec<Dimension> = results
        .iter()
        .filter(|r| r.available)
        .map(|r| r.dimension)
        .collect();

    if available.is_empty() {
        return Err(MatchError::InsufficientData);
    }

    let available_mass: f64 = available.iter().map(|d| base.get(*d)).sum();

    let mut weights = BTreeMap::new();
    for result in results {
        let weight = if !result.available {
            0.0
        } else if available_mass > f64::EPSILON {
            base.get(result.dimension) / available_mass
        } else {
            // Degenerate base set: every available dimension weighs zero;
            // fall back to an even split.
            1.0 / available.len() as f64
        };
        weights.insert(result.dimension, weight);
    }

    Ok(RedistributedWeights(weights))
}
