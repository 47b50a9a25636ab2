//! Workflow-run provider.
//!
//! Ships the transcript together with the current [`SessionMemory`] to a hosted
//! workflow and receives both a candidate report and updated memory. Persisting
//! the returned memory is the caller's job.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{AssessmentContext, AssessmentProvider, ProviderOutput, RawOutput, WorkflowRun};
use crate::auth::ApiKey;
use crate::{Error, Message, Result, SessionMemory};

/// Workflow API base URL used when none is configured.
pub const DEFAULT_WORKFLOW_URL: &str = "https://api.beeai.dev";

/// Model identifier used when the report does not name one.
pub const WORKFLOW_MODEL: &str = "beeai";

/// Fully resolved settings for [`WorkflowProvider`].
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub api_url: String,
    pub workflow_id: String,
    pub api_key: ApiKey,
    pub timeout: Duration,
}

impl WorkflowConfig {
    /// Run URL for the configured workflow.
    pub fn run_url(&self) -> String {
        format!(
            "{}/v1/workflows/{}/run",
            self.api_url.trim_end_matches('/'),
            self.workflow_id
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunInput<'a> {
    messages: &'a [Message],
    memory: &'a SessionMemory,
    parent_id: &'a str,
    student_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    input: RunInput<'a>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    output: Option<RunOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct RunOutput {
    #[serde(default)]
    final_report: Option<Value>,
    #[serde(default)]
    memory: Option<Value>,
}

impl RunResponse {
    fn into_run(self) -> WorkflowRun {
        let output = self.output.unwrap_or_default();
        let report = output.final_report.filter(|r| !r.is_null());
        let memory = output.memory.filter(|m| !m.is_null()).and_then(|m| {
            serde_json::from_value::<SessionMemory>(m)
                .map_err(|e| warn!(error = %e, "ignoring unparseable workflow memory"))
                .ok()
        });

        WorkflowRun {
            report,
            memory,
            trace_id: self.trace_id,
        }
    }
}

/// Provider backed by a hosted workflow with its own session memory.
pub struct WorkflowProvider {
    config: WorkflowConfig,
    client: reqwest::Client,
}

impl WorkflowProvider {
    /// Create a provider; the HTTP client carries the configured timeout.
    pub fn new(config: WorkflowConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }
}

#[async_trait]
impl AssessmentProvider for WorkflowProvider {
    fn name(&self) -> &str {
        "workflow"
    }

    async fn generate_assessment(
        &self,
        messages: &[Message],
        context: Option<&AssessmentContext>,
    ) -> Result<ProviderOutput> {
        let fallback_context = AssessmentContext::default();
        let context = context.unwrap_or(&fallback_context);

        let request = RunRequest {
            input: RunInput {
                messages,
                memory: &context.memory,
                parent_id: &context.parent_id,
                student_id: &context.student_id,
            },
        };

        debug!(workflow = %self.config.workflow_id, student_id = %context.student_id, "running workflow");

        let response = self
            .client
            .post(self.config.run_url())
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

        let body: RunResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;
        let run = body.into_run();

        let model = run
            .report
            .as_ref()
            .and_then(|r| r.get("model"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(WORKFLOW_MODEL)
            .to_string();

        Ok(ProviderOutput::new(RawOutput::Workflow(run), model))
    }

    fn uses_session_memory(&self) -> bool {
        true
    }
}
