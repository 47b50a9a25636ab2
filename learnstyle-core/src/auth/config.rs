//! Configuration for bearer-token verification

use serde::{Deserialize, Serialize};

/// Public signing keys for Firebase ID tokens
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Configuration for ID-token verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether tokens are verified. When disabled the bearer token itself is
    /// taken as the principal id (development only).
    #[serde(default)]
    pub enabled: bool,

    /// Identity project id; tokens must carry it as audience
    #[serde(default)]
    pub project_id: String,

    /// Where to fetch the JWKS signing keys
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,

    /// Clock skew leeway in seconds for token expiry validation
    #[serde(default = "default_clock_skew")]
    pub clock_skew_seconds: u64,
}

fn default_jwks_url() -> String {
    FIREBASE_JWKS_URL.to_string()
}

fn default_clock_skew() -> u64 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            jwks_url: default_jwks_url(),
            clock_skew_seconds: default_clock_skew(),
        }
    }
}

impl AuthConfig {
    /// Enabled verification for the given project
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            enabled: true,
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Expected `iss` claim
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    /// Check if the config is valid (has required fields when enabled)
    pub fn is_valid(&self) -> bool {
        if !self.enabled {
            return true;
        }
        !self.project_id.trim().is_empty() && !self.jwks_url.trim().is_empty()
    }
}
