use futures::future::join_all;

use super::{best_match, blended_mean, Dimension, DimensionScore};
use crate::provider::PromptKind;
use crate::resolver::SimilarityResolver;
use crate::{CandidateProfile, Importance, JobOffer};

/// A required skill whose best candidate match stays below this similarity
/// counts as fully missing, not partially covered.
pub const REQUIRED_MATCH_THRESHOLD: f64 = 0.8;

/// Technical skill coverage: every job skill is matched against the
/// candidate's best-fitting skill, required before preferred.
pub async fn score(
    resolver: &SimilarityResolver,
    candidate: &CandidateProfile,
    job: &JobOffer,
) -> DimensionScore {
    if job.hard_skills.is_empty() || candidate.hard_skills.is_empty() {
        return DimensionScore::unavailable(
            Dimension::HardSkills,
            "hard skills listed on neither or only one side",
        );
    }

    let evaluations = join_all(job.hard_skills.iter().map(|requirement| async move {
        let best = best_match(
            resolver,
            &candidate.hard_skills,
            &requirement.skill,
            PromptKind::HardSkill,
        )
        .await
        .map(|(_, score)| score)
        .unwrap_or(0.0);
        (requirement, best)
    }))
    .await;

    let mut required = Vec::new();
    let mut preferred = Vec::new();
    let mut covered = 0usize;

    for (requirement, best) in evaluations {
        match requirement.importance {
            Importance::Required => {
                let gated = if best < REQUIRED_MATCH_THRESHOLD { 0.0 } else { best };
                if gated > 0.0 {
                    covered += 1;
                }
                required.push(gated);
            }
            Importance::Preferred => {
                if best >= REQUIRED_MATCH_THRESHOLD {
                    covered += 1;
                }
                preferred.push(best);
            }
        }
    }

    // Job side is non-empty, so at least one class has entries.
    let score = blended_mean(&required, &preferred).unwrap_or(0.0);
    let detail = format!(
        "{covered}/{} job skills covered (required: {}, preferred: {})",
        job.hard_skills.len(),
        required.len(),
        preferred.len()
    );

    DimensionScore::scored(Dimension::HardSkills, score, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::{memory_cache, resolver_with, StubProvider};
    use crate::SkillRequirement;

    fn job_with(skills: Vec<SkillRequirement>) -> JobOffer {
        JobOffer {
            hard_skills: skills,
            ..JobOffer::default()
        }
    }

    fn candidate_with(skills: Vec<&str>) -> CandidateProfile {
        CandidateProfile {
            hard_skills: skills.into_iter().map(String::from).collect(),
            ..CandidateProfile::default()
        }
    }

    fn required(skill: &str) -> SkillRequirement {
        SkillRequirement {
            skill: skill.into(),
            importance: Importance::Required,
        }
    }

    fn preferred(skill: &str) -> SkillRequirement {
        SkillRequirement {
            skill: skill.into(),
            importance: Importance::Preferred,
        }
    }

    #[tokio::test]
    async fn empty_side_is_unavailable() {
        let resolver = resolver_with(memory_cache(), StubProvider::scoring(0.9));

        let result = score(&resolver, &candidate_with(vec![]), &job_with(vec![required("Rust")])).await;
        assert!(!result.available);
        assert_eq!(result.score, None);

        let result = score(&resolver, &candidate_with(vec!["Rust"]), &job_with(vec![])).await;
        assert!(!result.available);
    }

    #[tokio::test]
    async fn exact_and_related_skills_score_high() {
        // Unknown pairs would go to the provider; the stub returns a low
        // score so only normalization and knowledge-base matches count.
        let provider = StubProvider::scoring(0.1);
        let resolver = resolver_with(memory_cache(), provider.clone());

        let candidate = candidate_with(vec!["rust", "TypeScript"]);
        let job = job_with(vec![required("Rust"), required("JavaScript")]);

        let result = score(&resolver, &candidate, &job).await;
        // rust matches exactly (1.0); javascript↔typescript is a curated
        // relation (0.85). Both clear the required threshold.
        let expected = (1.0 + 0.85) / 2.0;
        assert!((result.score.unwrap() - expected).abs() < 1e-9);
        assert!(result.detail.starts_with("2/2"));
    }

    #[tokio::test]
    async fn weak_required_matches_are_zeroed() {
        let provider = StubProvider::scoring(0.5);
        let resolver = resolver_with(memory_cache(), provider);

        let candidate = candidate_with(vec!["Photoshop"]);
        let job = job_with(vec![required("Rust")]);

        let result = score(&resolver, &candidate, &job).await;
        assert_eq!(result.score, Some(0.0));
    }

    #[tokio::test]
    async fn preferred_skills_are_not_gated() {
        let provider = StubProvider::scoring(0.5);
        let resolver = resolver_with(memory_cache(), provider);

        let candidate = candidate_with(vec!["Photoshop"]);
        let job = job_with(vec![preferred("Rust")]);

        let result = score(&resolver, &candidate, &job).await;
        assert_eq!(result.score, Some(0.5));
    }

    #[tokio::test]
    async fn blends_required_and_preferred() {
        let provider = StubProvider::scoring(0.0);
        let resolver = resolver_with(memory_cache(), provider);

        let candidate = candidate_with(vec!["rust", "graphql"]);
        let job = job_with(vec![required("Rust"), preferred("GraphQL")]);

        let result = score(&resolver, &candidate, &job).await;
        // required mean 1.0, preferred mean 1.0.
        assert!((result.score.unwrap() - 1.0).abs() < 1e-9);
    }
}
