//! Session store backed by the `assessmentSessions` collection

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use learnstyle_models::SessionMemory;
use serde_json::Value;
use tracing::warn;

use super::{SessionKey, SessionStore};
use crate::StoreError;
use crate::store::{ASSESSMENT_SESSIONS, DocumentStore, to_document};

/// Stores session memory as merged documents keyed `<parentId>_<studentId>`.
pub struct DocumentSessionStore {
    store: Arc<dyn DocumentStore>,
}

impl DocumentSessionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionStore for DocumentSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionMemory>, StoreError> {
        let Some(doc) = self.store.get(ASSESSMENT_SESSIONS, &key.to_string()).await? else {
            return Ok(None);
        };

        match serde_json::from_value(Value::Object(doc)) {
            Ok(memory) => Ok(Some(memory)),
            Err(e) => {
                warn!(session = %key, error = %e, "unreadable session memory, starting fresh");
                Ok(None)
            }
        }
    }

    async fn save(&self, key: &SessionKey, memory: &SessionMemory) -> Result<(), StoreError> {
        let mut doc = to_document(memory)?;
        doc.insert("parentId".into(), Value::String(key.parent_id.clone()));
        doc.insert("studentId".into(), Value::String(key.student_id.clone()));
        doc.insert("updatedAt".into(), serde_json::to_value(Utc::now())?);

        self.store
            .set_merge(ASSESSMENT_SESSIONS, &key.to_string(), doc)
            .await
    }
}
