//! Bearer authentication middleware for axum

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use learnstyle_core::AuthError;

use crate::{AppState, error::ApiError};

/// Extract the bearer token from the Authorization header
fn extract_bearer(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verify the bearer token and attach the [`learnstyle_core::Principal`] to
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&request)
        .ok_or(AuthError::MissingToken)?
        .to_string();

    let principal = state.verifier.verify(&token).await?;
    tracing::debug!(uid = %principal.uid, "request authenticated");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
