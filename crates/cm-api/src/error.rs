use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;
use tracing::error;

use cm_common::db::MatchResultStorageError;
use cm_common::matching::MatchError;

/// Keep public error messages bounded and free of control characters; the
/// full error always lands in the logs.
fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_LEN)
        .collect::<String>();

    if message.chars().count() > MAX_LEN {
        cleaned.push('…');
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The match inputs were structurally valid but unscorable.
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();

        error!(code, status = %status, error = %self, "api_error");

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unprocessable(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Database(_) | ApiError::Internal(_) => {
                Cow::Borrowed("internal server error")
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(value: MatchError) -> Self {
        match value {
            MatchError::InsufficientData => ApiError::Unprocessable(value.to_string()),
            MatchError::MalformedAttribute(_) => ApiError::Unprocessable(value.to_string()),
        }
    }
}

impl From<MatchResultStorageError> for ApiError {
    fn from(value: MatchResultStorageError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<cm_common::db::SimilarityCacheError> for ApiError {
    fn from(value: cm_common::db::SimilarityCacheError) -> Self {
        ApiError::Database(value.to_string())
    }
}
