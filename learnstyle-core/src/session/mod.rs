//! Session memory persistence.
//!
//! The engine owns [`SessionMemory`]; stores here are durability adapters only.
//! Two implementations are provided: [`MemorySessionStore`] for tests and
//! single-process runs, and [`DocumentSessionStore`] over a [`DocumentStore`].

mod document;
mod memory;

use std::fmt;

use async_trait::async_trait;
use learnstyle_models::SessionMemory;
use tracing::warn;

use crate::StoreError;

pub use document::DocumentSessionStore;
pub use memory::MemorySessionStore;

/// Identifies one conversation: a parent assessing one student.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub parent_id: String,
    pub student_id: String,
}

impl SessionKey {
    pub fn new(parent_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            student_id: student_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.parent_id, self.student_id)
    }
}

/// Keyed persistence of per-conversation workflow state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load memory for `key`, `None` if nothing usable is stored.
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionMemory>, StoreError>;

    /// Store memory for `key`, replacing what was there.
    async fn save(&self, key: &SessionKey, memory: &SessionMemory) -> Result<(), StoreError>;

    /// Load memory, falling back to fresh defaults on absence or failure.
    async fn load_or_default(&self, key: &SessionKey) -> SessionMemory {
        match self.load(key).await {
            Ok(Some(memory)) => memory,
            Ok(None) => SessionMemory::default(),
            Err(e) => {
                warn!(session = %key, error = %e, "failed to load session memory");
                SessionMemory::default()
            }
        }
    }
}
