use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use cm_common::db::{fetch_match_result, fetch_top_matches_for_job, StoredMatch};
use cm_common::matching::MatchResult;
use cm_common::{CandidateProfile, JobOffer};

use crate::error::ApiError;
use crate::SharedState;

const DEFAULT_MATCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub candidate: CandidateProfile,
    pub job: JobOffer,
}

#[derive(Debug, Deserialize)]
pub struct TopMatchesParams {
    pub limit: Option<i64>,
}

/// Score one candidate against one job and return the full breakdown.
pub async fn run_match(
    State(state): State<SharedState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResult>, ApiError> {
    let result = state
        .engine
        .compute_match(&request.candidate, &request.job)
        .await?;
    Ok(Json(result))
}

/// Stored matches for a job, best first.
pub async fn top_matches(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
    Query(params): Query<TopMatchesParams>,
) -> Result<Json<Vec<StoredMatch>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_MATCH_LIMIT).clamp(1, 200);
    let matches = fetch_top_matches_for_job(&state.pool, &job_id, limit).await?;
    Ok(Json(matches))
}

/// One stored match by (job, candidate).
pub async fn get_match(
    State(state): State<SharedState>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Result<Json<StoredMatch>, ApiError> {
    let stored = fetch_match_result(&state.pool, &job_id, &candidate_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("no match stored for job {job_id} and candidate {candidate_id}"))
        })?;
    Ok(Json(stored))
}
