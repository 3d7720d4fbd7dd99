use futures::future::join_all;

use super::{best_match, Dimension, DimensionScore};
use crate::provider::PromptKind;
use crate::resolver::SimilarityResolver;
use crate::{CandidateProfile, JobOffer};

/// Behavioural-trait coverage: each candidate trait is credited with its
/// closest job-side trait, and the bests are averaged.
pub async fn score(
    resolver: &SimilarityResolver,
    candidate: &CandidateProfile,
    job: &JobOffer,
) -> DimensionScore {
    if candidate.soft_skills.is_empty() || job.soft_skills.is_empty() {
        return DimensionScore::unavailable(
            Dimension::SoftSkills,
            "soft skills extracted on neither or only one side",
        );
    }

    let bests = join_all(candidate.soft_skills.iter().map(|trait_term| async move {
        best_match(resolver, &job.soft_skills, trait_term, PromptKind::SoftSkill)
            .await
            .map(|(_, score)| score)
            .unwrap_or(0.0)
    }))
    .await;

    let score = bests.iter().sum::<f64>() / bests.len() as f64;
    let detail = format!(
        "{} candidate traits matched against {} job traits",
        candidate.soft_skills.len(),
        job.soft_skills.len()
    );

    DimensionScore::scored(Dimension::SoftSkills, score, detail)
}
