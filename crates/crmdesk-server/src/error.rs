//! HTTP-facing errors for the server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crmdesk_egress::EgressError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Identical backend call already in flight
    #[error("{0}")]
    Duplicate(String),

    /// Backend unreachable or request could not be sent
    #[error("Backend request failed: {0}")]
    Upstream(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl From<EgressError> for AppError {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::DuplicateCall { .. } => AppError::Duplicate(err.to_string()),
            EgressError::InvalidRequest(msg) => AppError::BadRequest(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Duplicate(_) => "duplicate_call",
            AppError::Upstream(_) => "bad_gateway",
            AppError::BadRequest(_) => "bad_request",
            AppError::Template(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        (self.status(), Json(body)).into_response()
    }
}
