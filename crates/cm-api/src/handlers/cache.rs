use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use cm_common::cache::CacheStats;
use cm_common::db::list_entries;

use crate::error::ApiError;
use crate::SharedState;

/// Hit/miss counters plus durable-tier size, for operational tooling.
pub async fn stats(State(state): State<SharedState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

#[derive(Debug, Deserialize)]
pub struct EntriesParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Page through stored similarities, newest first.
pub async fn entries(
    State(state): State<SharedState>,
    Query(params): Query<EntriesParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 500);
    let offset = params.offset.unwrap_or(0).max(0);

    let items = list_entries(&state.pool, limit, offset).await?;
    Ok(Json(json!({
        "limit": limit,
        "offset": offset,
        "items": items,
    })))
}
