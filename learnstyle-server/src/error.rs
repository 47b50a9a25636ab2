//! Server error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use learnstyle_core::{AssessmentError, AuthError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur running the learnstyle server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
}

/// Errors returned from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body could not be parsed
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// Missing or rejected bearer token
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Assessment(#[from] AssessmentError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Assessment(e) => match e {
                AssessmentError::Validation(_) => StatusCode::BAD_REQUEST,
                AssessmentError::Forbidden(_) => StatusCode::FORBIDDEN,
                AssessmentError::StudentNotFound(_) => StatusCode::NOT_FOUND,
                AssessmentError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "INVALID_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Assessment(e) => e.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            // Token and storage details stay in the logs
            ApiError::Unauthorized(e) => {
                tracing::debug!(error = %e, "request rejected");
                "Unauthorized".to_string()
            }
            ApiError::Assessment(AssessmentError::Persistence(e)) => {
                tracing::error!(error = %e, "failed to persist assessment");
                "Failed to persist assessment".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: self.code().to_string(),
            }),
        )
            .into_response()
    }
}
