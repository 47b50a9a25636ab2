//! Credential management for provider API keys.
//!
//! Keys are looked up in the system keyring first, then (when enabled) in
//! provider-specific environment variables for CI and container deployments.
//!
//! # Example
//!
//! ```ignore
//! use learnstyle_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("learnstyle").with_env_fallback();
//! store.set("workflow", "bee-...")?;
//! let key = store.get("workflow")?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// A secret API key or bearer token that never prints its value.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret value. Only call this when building a request.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Environment variables checked for each provider, in order.
const ENV_VARS: &[(&str, &[&str])] = &[
    ("gemini", &["VERTEX_ACCESS_TOKEN", "GOOGLE_API_KEY"]),
    ("workflow", &["BEEAI_API_KEY"]),
];

/// Providers that take a credential.
pub fn credential_providers() -> impl Iterator<Item = &'static str> {
    ENV_VARS.iter().map(|(provider, _)| *provider)
}

/// Environment variables consulted for `provider`, in order.
pub fn env_vars_for_provider(provider: &str) -> &'static [&'static str] {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, vars)| *vars)
        .unwrap_or(&[])
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Keyring,
    Environment,
}

/// Credential lookup over the system keyring with optional environment fallback.
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a store using `service_name` as the keyring service.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Also check provider environment variables when the keyring has nothing.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get the key for `provider`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if neither source has a key.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider, "retrieved API key from keyring");
            return Ok(key);
        }

        if self.env_fallback
            && let Some(key) = self.get_from_env(provider)
        {
            debug!(provider, "retrieved API key from environment");
            return Ok(key);
        }

        Err(Error::CredentialsNotFound(provider.to_string()))
    }

    /// Like [`get`](Self::get) but `None` when missing.
    pub fn find(&self, provider: &str) -> Option<ApiKey> {
        self.get(provider).ok()
    }

    /// Store a key in the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConfigured` for a provider that takes no credential
    /// or an empty key, and `Error::Keyring` if the keyring rejects the write.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        if env_vars_for_provider(provider).is_empty() {
            return Err(Error::NotConfigured(format!(
                "'{provider}' does not take a credential"
            )));
        }
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::NotConfigured(format!("empty key for '{provider}'")));
        }

        let entry = self.keyring_entry(provider)?;
        entry
            .set_password(key)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(provider, "stored API key in keyring");
        Ok(())
    }

    /// Where the key for `provider` would come from, if anywhere.
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        if self.get_from_keyring(provider).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.get_from_env(provider).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, provider: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, provider).map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, provider: &str) -> Option<ApiKey> {
        let entry = self.keyring_entry(provider).ok()?;
        entry.get_password().ok().map(ApiKey::new)
    }

    fn get_from_env(&self, provider: &str) -> Option<ApiKey> {
        env_vars_for_provider(provider)
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(ApiKey::new)
    }
}
