use futures::future::join_all;

use super::{blended_mean, Dimension, DimensionScore, MatchError};
use crate::provider::PromptKind;
use crate::resolver::SimilarityResolver;
use crate::{CandidateProfile, Importance, JobOffer};

const TITLE_WEIGHT: f64 = 0.6;
const DURATION_WEIGHT: f64 = 0.4;

/// Ratio of served months to required months, capped at 1.0 so surplus
/// experience never scores above a perfect fit.
fn duration_ratio(candidate_months: i32, required_months: i32) -> f64 {
    if required_months <= 0 {
        return 1.0;
    }
    (candidate_months as f64 / required_months as f64).min(1.0)
}

/// Experience fit: each requirement is matched with the candidate entry
/// whose combined title similarity and duration ratio is best.
pub async fn score(
    resolver: &SimilarityResolver,
    candidate: &CandidateProfile,
    job: &JobOffer,
) -> Result<DimensionScore, MatchError> {
    if let Some(entry) = candidate.experiences.iter().find(|e| e.months < 0) {
        return Err(MatchError::MalformedAttribute(format!(
            "candidate experience '{}' has negative duration {} months",
            entry.title, entry.months
        )));
    }
    if let Some(req) = job.required_experiences.iter().find(|e| e.months < 0) {
        return Err(MatchError::MalformedAttribute(format!(
            "job experience requirement '{}' has negative duration {} months",
            req.title, req.months
        )));
    }

    if candidate.experiences.is_empty() || job.required_experiences.is_empty() {
        return Ok(DimensionScore::unavailable(
            Dimension::Experience,
            "experience entries missing on one or both sides",
        ));
    }

    let evaluations = join_all(job.required_experiences.iter().map(|requirement| async move {
        let combined = join_all(candidate.experiences.iter().map(|entry| async move {
            let title = resolver
                .resolve(&entry.title, &requirement.title, PromptKind::JobTitle)
                .await;
            TITLE_WEIGHT * title + DURATION_WEIGHT * duration_ratio(entry.months, requirement.months)
        }))
        .await;

        let best = combined.into_iter().fold(0.0f64, f64::max);
        (requirement.importance, best)
    }))
    .await;

    let mut required = Vec::new();
    let mut preferred = Vec::new();
    for (importance, best) in evaluations {
        match importance {
            Importance::Required => required.push(best),
            Importance::Preferred => preferred.push(best),
        }
    }

    let score = blended_mean(&required, &preferred).unwrap_or(0.0);
    let detail = format!(
        "{} candidate entries against {} requirements ({} required, {} preferred)",
        candidate.experiences.len(),
        job.required_experiences.len(),
        required.len(),
        preferred.len()
    );

    Ok(DimensionScore::scored(Dimension::Experience, score, detail))
}
