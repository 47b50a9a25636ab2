//! Per-conversation workflow state.

use serde::{Deserialize, Serialize};

use crate::AssessmentResult;

/// Status of a multi-turn assessment session.
///
/// `Complete` is terminal: the decision engine never moves a session out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    NeedsMoreData,
    Complete,
}

/// Workflow state kept per (parent, student) pair.
///
/// Field names are snake_case on the wire because workflow backends exchange
/// this document verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMemory {
    #[serde(default)]
    pub question_history: Vec<String>,
    #[serde(default)]
    pub response_scores: Vec<f64>,
    #[serde(default)]
    pub session_status: SessionStatus,
    #[serde(default)]
    pub focus_modality: Option<String>,
    #[serde(default)]
    pub final_report: Option<AssessmentResult>,
}

impl SessionMemory {
    /// Whether a final report has been committed for this session.
    pub fn is_complete(&self) -> bool {
        self.session_status == SessionStatus::Complete
    }
}
