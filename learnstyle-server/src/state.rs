//! Shared application state for the learnstyle server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use learnstyle_core::{AssessmentEngine, TokenVerifier};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Decision engine for assessment turns
    pub engine: Arc<AssessmentEngine>,
    /// Bearer-token verifier used by the auth middleware
    pub verifier: Arc<dyn TokenVerifier>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<AssessmentEngine>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            engine,
            verifier,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
