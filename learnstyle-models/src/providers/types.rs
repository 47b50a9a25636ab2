//! Request and response types for assessment providers.

use serde_json::Value;

use crate::SessionMemory;

/// Identity and workflow state passed alongside the transcript.
#[derive(Debug, Clone, Default)]
pub struct AssessmentContext {
    pub parent_id: String,
    pub student_id: String,
    /// Current session memory; shipped to workflow backends.
    pub memory: SessionMemory,
}

impl AssessmentContext {
    pub fn new(parent_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            student_id: student_id.into(),
            memory: SessionMemory::default(),
        }
    }

    pub fn with_memory(mut self, memory: SessionMemory) -> Self {
        self.memory = memory;
        self
    }
}

/// Unstructured provider output, tagged by the kind of backend that produced it.
///
/// Every variant goes through [`crate::normalize::normalize`]; nothing here is
/// trusted by field presence.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Deterministic placeholder object from the offline provider.
    Stub(Value),
    /// Generated text that may contain a JSON object.
    Text(String),
    /// Structured workflow run.
    Workflow(WorkflowRun),
    /// Nothing usable was produced.
    Empty,
}

/// Output of a workflow-style backend run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowRun {
    /// Candidate report (`output.final_report`), unvalidated.
    pub report: Option<Value>,
    /// Updated session memory (`output.memory`), when it parsed.
    pub memory: Option<SessionMemory>,
    pub trace_id: Option<String>,
}

/// What a provider returns from a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub raw: RawOutput,
    /// Identifier of the model or backend that produced `raw`.
    pub model: String,
}

impl ProviderOutput {
    pub fn new(raw: RawOutput, model: impl Into<String>) -> Self {
        Self {
            raw,
            model: model.into(),
        }
    }

    /// Session memory returned by a workflow backend, if any.
    pub fn memory(&self) -> Option<&SessionMemory> {
        match &self.raw {
            RawOutput::Workflow(run) => run.memory.as_ref(),
            _ => None,
        }
    }

    /// Trace id of a workflow run, for correlating with the backend's logs.
    pub fn trace_id(&self) -> Option<&str> {
        match &self.raw {
            RawOutput::Workflow(run) => run.trace_id.as_deref(),
            _ => None,
        }
    }
}
