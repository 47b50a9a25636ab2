//! Persistence collaborator.
//!
//! Records of truth live in a document store with three collections:
//! `students` (keyed by student id), the append-only `assessments` log and
//! `assessmentSessions` (keyed by `<parentId>_<studentId>`).

mod file;
mod memory;
pub mod students;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::StoreError;

pub use file::JsonFileDocumentStore;
pub use memory::MemoryDocumentStore;

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, Value>;

pub const STUDENTS: &str = "students";
pub const ASSESSMENTS: &str = "assessments";
pub const ASSESSMENT_SESSIONS: &str = "assessmentSessions";

/// Key-value document store with get, update, merge and append semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Overwrite `fields` on an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document)
    -> Result<(), StoreError>;

    /// Merge `fields` into the document, creating it when missing.
    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Append a new document with a generated id and return the id.
    async fn add(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// All documents in a collection.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;
}

/// Serialize `value` into a [`Document`].
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
    }

    #[test]
    fn to_document_accepts_structs() {
        let doc = to_document(&Sample { name: "a" }).unwrap();
        assert_eq!(doc.get("name"), Some(&json!("a")));
    }

    #[test]
    fn to_document_rejects_scalars() {
        let err = to_document(&42).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }
}
