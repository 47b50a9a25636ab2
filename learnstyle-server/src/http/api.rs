//! REST API handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use learnstyle_core::{AssessmentRequest, Principal};
use learnstyle_models::AssessmentResult;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Name of the active assessment provider
    pub provider: String,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        provider: state.engine.provider_name().to_string(),
    })
}

/// POST /api/learning-style/assess - Run one assessment turn
///
/// Also mounted at `/api/assessment/chat`.
pub async fn assess(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let result = state.engine.assess(&principal.uid, &request).await?;
    Ok(Json(result))
}
