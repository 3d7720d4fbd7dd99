use super::{blended_mean, Dimension, DimensionScore};
use crate::knowledge;
use crate::{CandidateProfile, Importance, JobOffer};

/// Proficiency deficit penalty per ordinal step.
const REQUIRED_STEP_PENALTY: f64 = 0.4;
const PREFERRED_STEP_PENALTY: f64 = 0.2;

fn level_score(candidate_level: u8, required_level: u8, importance: Importance) -> f64 {
    let diff = candidate_level as f64 - required_level as f64;
    if diff < 0.0 {
        let penalty = match importance {
            Importance::Required => REQUIRED_STEP_PENALTY,
            Importance::Preferred => PREFERRED_STEP_PENALTY,
        };
        (1.0 - penalty * diff.abs()).max(0.0)
    } else {
        // Exceeding the requirement is simply a full score.
        (1.0 + 0.05 * diff).min(1.0)
    }
}

/// Language fit over the job's listed languages. A job with no language
/// requirements makes this dimension not applicable, and a candidate with
/// no language data at all leaves it unavailable: both move its weight to
/// the others instead of scoring zero. A candidate who lists languages but
/// lacks a required one is scored at level none.
pub fn score(candidate: &CandidateProfile, job: &JobOffer) -> DimensionScore {
    if job.languages.is_empty() {
        return DimensionScore::unavailable(
            Dimension::Languages,
            "job specifies no language requirements",
        );
    }
    if candidate.languages.is_empty() {
        return DimensionScore::unavailable(
            Dimension::Languages,
            "no language data on the candidate side",
        );
    }

    let mut required = Vec::new();
    let mut preferred = Vec::new();
    let mut shortfalls = Vec::new();

    for requirement in &job.languages {
        let required_level = knowledge::language_level(&requirement.level).unwrap_or(0);
        let candidate_level = candidate
            .language_level(&requirement.language)
            .and_then(knowledge::language_level)
            .unwrap_or(0);

        let score = level_score(candidate_level, required_level, requirement.importance);
        if candidate_level < required_level {
            shortfalls.push(requirement.language.clone());
        }

        match requirement.importance {
            Importance::Required => required.push(score),
            Importance::Preferred => preferred.push(score),
        }
    }

    // Job side is non-empty, so the blend always produces a value.
    let score = blended_mean(&required, &preferred).unwrap_or(0.0);
    let detail = if shortfalls.is_empty() {
        format!("all {} language requirements met", job.languages.len())
    } else {
        format!("below required level: {}", shortfalls.join(", "))
    };

    DimensionScore::scored(Dimension::Languages, score, detail)
}
