//! Managed LLM provider using the `generateContent` REST endpoint.
//!
//! # Example
//!
//! ```ignore
//! use learnstyle_models::providers::{GeminiSection, GeminiProvider};
//!
//! let config = section.resolve(Some(api_key))?;
//! let provider = GeminiProvider::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AssessmentContext, AssessmentProvider, ProviderOutput, RawOutput};
use crate::auth::ApiKey;
use crate::{Error, LearningStyle, Message, Result};

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Fully resolved settings for [`GeminiProvider`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL, e.g. `https://us-central1-aiplatform.googleapis.com`.
    pub endpoint: String,
    pub project: String,
    pub location: String,
    pub model: String,
    /// Bearer token sent with every request.
    pub api_key: ApiKey,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Full `generateContent` URL for the configured model.
    pub fn url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.project,
            self.location,
            self.model
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// generateContent wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// All candidate text parts, concatenated and trimmed.
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Build the strict-JSON instruction prompt followed by the transcript.
pub(crate) fn build_prompt(messages: &[Message]) -> String {
    let styles = LearningStyle::ALL
        .iter()
        .map(|s| format!("\"{}\"", s.as_str()))
        .collect::<Vec<_>>()
        .join(",");

    let transcript = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    [
        "You are an assistant that must return STRICT JSON only.".to_string(),
        "Analyze the conversation and output JSON with exactly these keys:".to_string(),
        "learningStyle, confidence, explanation, nextSteps, model, createdAt.".to_string(),
        format!("learningStyle must be one of [{styles}]."),
        "confidence is a number from 0 to 1.".to_string(),
        "explanation is a short parent-friendly string.".to_string(),
        "nextSteps is an array of 3-6 short suggestions.".to_string(),
        "model should be the model name you used.".to_string(),
        "createdAt must be an ISO timestamp.".to_string(),
        "Conversation transcript:".to_string(),
        transcript,
    ]
    .join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiProvider
// ────────────────────────────────────────────────────────────────────────────

/// Provider backed by a managed LLM API.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider; the HTTP client carries the configured timeout.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl AssessmentProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_assessment(
        &self,
        messages: &[Message],
        _context: Option<&AssessmentContext>,
    ) -> Result<ProviderOutput> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(messages)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        debug!(model = %self.config.model, messages = messages.len(), "calling generateContent");

        let response = self
            .client
            .post(self.config.url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout)
                } else {
                    Error::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi { status, body });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let text = body.text();
        let raw = if text.is_empty() {
            RawOutput::Empty
        } else {
            RawOutput::Text(text)
        };

        Ok(ProviderOutput::new(raw, self.config.model.clone()))
    }
}
