use super::{Dimension, DimensionScore, MatchError};
use crate::{CandidateProfile, JobOffer};

/// Logistics checks: remote-work compatibility and salary fit. Each
/// sub-criterion needs data from both sides to count; with no sub-criterion
/// populated the dimension is not applicable.
pub fn score(candidate: &CandidateProfile, job: &JobOffer) -> Result<DimensionScore, MatchError> {
    if let Some(salary) = job.salary.filter(|s| *s < 0.0) {
        return Err(MatchError::MalformedAttribute(format!(
            "job salary is negative: {salary}"
        )));
    }
    if let Some(min_salary) = candidate.min_salary.filter(|s| *s < 0.0) {
        return Err(MatchError::MalformedAttribute(format!(
            "candidate minimum salary is negative: {min_salary}"
        )));
    }

    let mut sub_scores = Vec::new();
    let mut notes = Vec::new();

    if let (Some(wants), Some(offers)) = (candidate.wants_remote, job.offers_remote) {
        let fit = if wants == offers { 1.0 } else { 0.0 };
        sub_scores.push(fit);
        notes.push(if fit == 1.0 {
            "remote preference compatible"
        } else {
            "remote preference conflicts"
        });
    }

    if let (Some(min_salary), Some(salary)) = (candidate.min_salary, job.salary) {
        let fit = if salary >= min_salary { 1.0 } else { 0.0 };
        sub_scores.push(fit);
        notes.push(if fit == 1.0 {
            "salary meets the candidate minimum"
        } else {
            "salary below the candidate minimum"
        });
    }

    if sub_scores.is_empty() {
        return Ok(DimensionScore::unavailable(
            Dimension::Additional,
            "no logistics criteria populated on both sides",
        ));
    }

    let score = sub_scores.iter().sum::<f64>() / sub_scores.len() as f64;
    Ok(DimensionScore::scored(
        Dimension::Additional,
        score,
        notes.join(" / "),
    ))
}
