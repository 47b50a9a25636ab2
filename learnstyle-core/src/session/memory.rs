//! In-process session store

use std::collections::HashMap;

use async_trait::async_trait;
use learnstyle_models::SessionMemory;
use tokio::sync::RwLock;

use super::{SessionKey, SessionStore};
use crate::StoreError;

/// Session memory kept in a map for the life of the process.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, SessionMemory>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionMemory>, StoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn save(&self, key: &SessionKey, memory: &SessionMemory) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(key.clone(), memory.clone());
        Ok(())
    }
}
