//! Provider configuration.
//!
//! Built once at process start (from TOML and the environment) and handed to
//! [`crate::ProviderRegistry`]. Resolution into a concrete variant config fails
//! closed: a remote variant with missing settings or credentials is
//! unavailable, never half-configured.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::gemini::{DEFAULT_GEMINI_MODEL, GeminiConfig};
use super::workflow::{DEFAULT_WORKFLOW_URL, WorkflowConfig};
use crate::auth::ApiKey;
use crate::{Error, Result};

/// Default remote request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Which provider variant to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Workflow if configured, then Gemini, then the stub.
    #[default]
    Auto,
    Stub,
    Gemini,
    Workflow,
}

/// Managed LLM settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeminiSection {
    pub project: Option<String>,
    pub location: Option<String>,
    pub model: Option<String>,
    /// Base URL override (defaults to the regional endpoint).
    pub endpoint: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
}

/// Workflow backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSection {
    pub api_url: Option<String>,
    pub workflow_id: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Provider configuration as loaded from TOML and the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
}

/// Non-empty trimmed value of the first variable that is set.
fn first_env(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Positive number from the environment; anything else is ignored.
fn positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|v| v.parse::<T>().ok())
        .filter(|v| *v > T::default())
}

impl ProviderConfig {
    /// Overlay process environment variables onto this config.
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Overlay variables from `lookup`. Set variables win over file values.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let gemini = &mut self.gemini;
        if let Some(project) = first_env(&lookup, &["GOOGLE_CLOUD_PROJECT"]) {
            gemini.project = Some(project);
        }
        if let Some(location) = first_env(&lookup, &["VERTEX_REGION", "VERTEX_LOCATION"]) {
            gemini.location = Some(location);
        }
        if let Some(model) = first_env(&lookup, &["VERTEX_MODEL"]) {
            gemini.model = Some(model);
        }
        if let Some(endpoint) = first_env(&lookup, &["VERTEX_ENDPOINT"]) {
            gemini.endpoint = Some(endpoint);
        }
        if let Some(temperature) = positive(first_env(&lookup, &["VERTEX_TEMPERATURE"])) {
            gemini.temperature = Some(temperature);
        }
        if let Some(tokens) = positive(first_env(&lookup, &["VERTEX_MAX_TOKENS"])) {
            gemini.max_output_tokens = Some(tokens);
        }
        if let Some(timeout) = positive(first_env(&lookup, &["VERTEX_TIMEOUT_MS"])) {
            gemini.timeout_ms = Some(timeout);
        }

        let workflow = &mut self.workflow;
        if let Some(url) = first_env(&lookup, &["BEEAI_API_URL"]) {
            workflow.api_url = Some(url);
        }
        if let Some(id) = first_env(&lookup, &["BEEAI_WORKFLOW_ID", "BEEAI_WORKFLOW_PATH"]) {
            workflow.workflow_id = Some(id);
        }
        if let Some(timeout) = positive(first_env(&lookup, &["BEEAI_TIMEOUT_MS"])) {
            workflow.timeout_ms = Some(timeout);
        }

        if let Some(kind) = first_env(&lookup, &["LEARNSTYLE_PROVIDER"])
            .and_then(|k| serde_json::from_value(serde_json::Value::String(k)).ok())
        {
            self.kind = kind;
        }

        self
    }
}

fn required(value: &Option<String>, what: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::NotConfigured(format!("missing {what}")))
}

fn timeout_or_default(timeout_ms: Option<u64>) -> Duration {
    Duration::from_millis(timeout_ms.filter(|t| *t > 0).unwrap_or(DEFAULT_TIMEOUT_MS))
}

impl GeminiSection {
    /// Resolve into a complete config, or fail if anything required is missing.
    pub fn resolve(&self, api_key: Option<ApiKey>) -> Result<GeminiConfig> {
        let project = required(&self.project, "gemini project")?;
        let location = required(&self.location, "gemini location")?;
        let api_key = api_key.ok_or_else(|| Error::CredentialsNotFound("gemini".to_string()))?;

        let endpoint = self
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com"));

        Ok(GeminiConfig {
            endpoint,
            project,
            location,
            model: self
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_key,
            temperature: self
                .temperature
                .filter(|t| *t > 0.0)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: self
                .max_output_tokens
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            timeout: timeout_or_default(self.timeout_ms),
        })
    }
}

impl WorkflowSection {
    /// Resolve into a complete config, or fail if anything required is missing.
    pub fn resolve(&self, api_key: Option<ApiKey>) -> Result<WorkflowConfig> {
        let workflow_id = required(&self.workflow_id, "workflow id")?;
        let api_key =
            api_key.ok_or_else(|| Error::CredentialsNotFound("workflow".to_string()))?;

        Ok(WorkflowConfig {
            api_url: self
                .api_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WORKFLOW_URL.to_string()),
            workflow_id,
            api_key,
            timeout: timeout_or_default(self.timeout_ms),
        })
    }
}
