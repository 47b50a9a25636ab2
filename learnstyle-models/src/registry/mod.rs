//! Provider registry.
//!
//! Resolves the configured [`AssessmentProvider`] once and caches it. The cache
//! is owned by the registry instance rather than the process, and
//! [`ProviderRegistry::invalidate`] drops it so tests can swap configuration.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::Result;
use crate::auth::CredentialStore;
use crate::providers::{
    AssessmentProvider, GeminiProvider, ProviderConfig, ProviderKind, StubProvider,
    WorkflowProvider,
};

/// Lazily resolves and caches the provider selected by [`ProviderConfig`].
pub struct ProviderRegistry {
    config: ProviderConfig,
    credentials: CredentialStore,
    cached: RwLock<Option<Arc<dyn AssessmentProvider>>>,
}

impl ProviderRegistry {
    pub fn new(config: ProviderConfig, credentials: CredentialStore) -> Self {
        Self {
            config,
            credentials,
            cached: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The cached provider, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Fails only when a remote kind was selected explicitly and its
    /// configuration or credentials are incomplete.
    pub fn provider(&self) -> Result<Arc<dyn AssessmentProvider>> {
        if let Some(provider) = self
            .cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            return Ok(Arc::clone(provider));
        }

        let provider = self.resolve()?;
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Drop the cached provider so the next call re-resolves it.
    pub fn invalidate(&self) {
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Build a provider from configuration without touching the cache.
    pub fn resolve(&self) -> Result<Arc<dyn AssessmentProvider>> {
        let provider: Arc<dyn AssessmentProvider> = match self.config.kind {
            ProviderKind::Stub => Arc::new(StubProvider::new()),
            ProviderKind::Gemini => Arc::new(self.gemini()?),
            ProviderKind::Workflow => Arc::new(self.workflow()?),
            ProviderKind::Auto => match self.workflow() {
                Ok(provider) => Arc::new(provider),
                Err(workflow_err) => {
                    debug!(error = %workflow_err, "workflow provider unavailable");
                    match self.gemini() {
                        Ok(provider) => Arc::new(provider),
                        Err(gemini_err) => {
                            debug!(error = %gemini_err, "gemini provider unavailable");
                            Arc::new(StubProvider::new())
                        }
                    }
                }
            },
        };

        info!(provider = provider.name(), "assessment provider selected");
        Ok(provider)
    }

    fn gemini(&self) -> Result<GeminiProvider> {
        let config = self.config.gemini.resolve(self.credentials.find("gemini"))?;
        GeminiProvider::new(config)
    }

    fn workflow(&self) -> Result<WorkflowProvider> {
        let config = self
            .config
            .workflow
            .resolve(self.credentials.find("workflow"))?;
        WorkflowProvider::new(config)
    }
}
