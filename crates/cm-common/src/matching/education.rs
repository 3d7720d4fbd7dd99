use super::{Dimension, DimensionScore};
use crate::knowledge;
use crate::provider::PromptKind;
use crate::resolver::SimilarityResolver;
use crate::{CandidateProfile, JobOffer};

const LEVEL_WEIGHT: f64 = 0.7;
const FIELD_WEIGHT: f64 = 0.3;

/// Degree fit: ordinal level comparison (meeting or exceeding the required
/// level scores full, lower levels get proportional credit) blended with
/// field-of-study similarity.
pub async fn score(
    resolver: &SimilarityResolver,
    candidate: &CandidateProfile,
    job: &JobOffer,
) -> DimensionScore {
    let (candidate_degree, required_degree) = match (
        candidate.degree.as_deref().filter(|d| !d.trim().is_empty()),
        job.required_degree.as_deref().filter(|d| !d.trim().is_empty()),
    ) {
        (Some(c), Some(r)) => (c, r),
        _ => {
            return DimensionScore::unavailable(
                Dimension::Education,
                "degree missing on one or both sides",
            );
        }
    };

    let (candidate_level, candidate_field) = knowledge::parse_degree(candidate_degree);
    let (required_level, required_field) = knowledge::parse_degree(required_degree);

    let level_score = match (candidate_level, required_level) {
        (Some(candidate), Some(required)) if required > 0 => {
            (candidate as f64 / required as f64).min(1.0)
        }
        (Some(_), _) => 1.0,
        (None, Some(_)) => 0.0,
        (None, None) => 0.0,
    };

    let field_similarity = resolver
        .resolve(&candidate_field, &required_field, PromptKind::DegreeField)
        .await;

    let score = LEVEL_WEIGHT * level_score + FIELD_WEIGHT * field_similarity;
    let detail = format!(
        "level {:?} vs required {:?}, field similarity {:.2}",
        candidate_level, required_level, field_similarity
    );

    DimensionScore::scored(Dimension::Education, score, detail)
}
