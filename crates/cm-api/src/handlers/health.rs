use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::SharedState;

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness: the service is only useful once the database answers.
pub async fn readyz(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    state
        .pool
        .get()
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;
    Ok(Json(json!({ "status": "ready" })))
}
