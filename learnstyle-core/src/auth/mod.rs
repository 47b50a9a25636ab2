//! Bearer-token verification.
//!
//! Tokens are consumed as a black box that yields a verified [`Principal`]. The
//! production verifier checks RS256 ID tokens against a cached JWKS; the
//! development verifier trusts the token text as the principal id.

mod config;
mod context;
mod error;
mod validator;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

pub use config::{AuthConfig, FIREBASE_JWKS_URL};
pub use context::Principal;
pub use error::AuthError;
pub use validator::JwtValidator;

/// Turns a bearer token into a verified principal.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Accepts any non-empty token and uses it as the principal id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevTokenVerifier;

#[async_trait]
impl TokenVerifier for DevTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(Principal::new(token))
    }
}

/// Build the verifier selected by `config`.
///
/// # Errors
///
/// Returns [`AuthError::Misconfigured`] when verification is enabled without a
/// project id or JWKS URL.
pub fn verifier_from_config(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, AuthError> {
    if !config.enabled {
        warn!("token verification disabled; bearer tokens are trusted as user ids");
        return Ok(Arc::new(DevTokenVerifier));
    }

    if !config.is_valid() {
        return Err(AuthError::Misconfigured(
            "auth.project_id and auth.jwks_url are required when auth is enabled".into(),
        ));
    }

    Ok(Arc::new(JwtValidator::new(config.clone())))
}
