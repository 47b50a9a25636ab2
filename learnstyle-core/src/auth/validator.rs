//! JWT validation with JWKS caching

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AuthConfig, AuthError, Principal, TokenVerifier};

/// JWKS cache TTL (1 hour)
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// JWT validator with JWKS caching
pub struct JwtValidator {
    config: AuthConfig,
    jwks_cache: Arc<RwLock<JwksCache>>,
    http_client: reqwest::Client,
}

struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl JwksCache {
    fn new() -> Self {
        Self {
            keys: HashMap::new(),
            fetched_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        match self.fetched_at {
            Some(fetched_at) => fetched_at.elapsed() > JWKS_CACHE_TTL,
            None => true,
        }
    }
}

/// JWKS response
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Individual JWK
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

/// ID-token claims this service reads
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
}

impl JwtValidator {
    /// Create a new JwtValidator with the given configuration
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            jwks_cache: Arc::new(RwLock::new(JwksCache::new())),
            http_client: reqwest::Client::new(),
        }
    }

    /// Validate an ID token and return the principal
    pub async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or_else(|| {
            AuthError::InvalidFormat("missing kid in token header".to_string())
        })?;

        let key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.project_id]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation.leeway = self.config.clock_skew_seconds;

        let claims = decode::<IdTokenClaims>(token, &key, &validation)?.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidFormat("empty sub claim".to_string()));
        }

        let mut principal = Principal::new(claims.sub);
        if let Some(expires_at) = DateTime::from_timestamp(claims.exp, 0) {
            principal = principal.with_expiry(expires_at);
        }
        if let Some(email) = claims.email {
            principal = principal.with_email(email);
        }

        Ok(principal)
    }

    /// Get a decoding key by kid, fetching JWKS if needed
    async fn get_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if !cache.is_expired()
                && let Some(key) = cache.keys.get(kid)
            {
                return Ok(key.clone());
            }
        }

        // Cache miss, expired, or a rotated key: refresh once
        debug!(kid, "refreshing JWKS");
        self.refresh_jwks().await?;

        let cache = self.jwks_cache.read().await;
        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKeyId(kid.to_string()))
    }

    /// Force refresh the JWKS cache
    pub async fn refresh_jwks(&self) -> Result<(), AuthError> {
        let url = &self.config.jwks_url;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty == "RSA" {
                let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                    .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;
                keys.insert(jwk.kid, key);
            }
        }

        let mut cache = self.jwks_cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());

        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl TokenVerifier for JwtValidator {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        self.validate(token).await
    }
}
