//! JSON file-backed document store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::memory::{Collections, apply_add, apply_set_merge, apply_update};
use super::{Document, DocumentStore};
use crate::StoreError;

/// Documents file name
const DOCUMENTS_FILE: &str = "documents.json";

/// Document store that keeps everything in memory and rewrites a single JSON
/// file after every write.
///
/// Writes are serialized. Each one is applied to a copy, the copy is written to
/// disk, and only then does it replace the in-memory state, so a failed write
/// leaves both untouched.
pub struct JsonFileDocumentStore {
    collections: RwLock<Collections>,
    write_lock: Mutex<()>,
    file_path: PathBuf,
}

impl JsonFileDocumentStore {
    /// Load documents from `data_dir` or start empty.
    pub async fn load(data_dir: &Path) -> Result<Self, StoreError> {
        let file_path = data_dir.join(DOCUMENTS_FILE);

        let collections: Collections = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .await
                .map_err(|e| StoreError::Io(format!("failed to read documents: {}", e)))?;
            serde_json::from_str(&content)?
        } else {
            Collections::new()
        };

        debug!(path = %file_path.display(), collections = collections.len(), "loaded document store");

        Ok(Self {
            collections: RwLock::new(collections),
            write_lock: Mutex::new(()),
            file_path,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Apply one change, persist it, then publish it to readers.
    async fn commit<T, F>(&self, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Collections) -> Result<T, StoreError> + Send,
    {
        let _writer = self.write_lock.lock().await;

        let mut next = self.collections.read().await.clone();
        let out = apply(&mut next)?;
        self.persist(&next).await?;
        *self.collections.write().await = next;

        Ok(out)
    }

    /// Persist all documents to file
    async fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("failed to create data dir: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(collections)?;

        fs::write(&self.file_path, content)
            .await
            .map_err(|e| StoreError::Io(format!("failed to write documents: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.commit(|c| apply_update(c, collection, id, fields))
            .await
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.commit(|c| {
            apply_set_merge(c, collection, id, fields);
            Ok(())
        })
        .await
    }

    async fn add(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        self.commit(|c| Ok(apply_add(c, collection, document))).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_empty_store() {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();

        assert!(store.get("students", "s1").await.unwrap().is_none());
        assert!(!store.file_path().exists());
    }

    #[tokio::test]
    async fn test_persistence() {
        let temp_dir = tempdir().unwrap();

        {
            let store = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();
            store
                .set_merge("students", "s1", doc(json!({"parentId": "p1"})))
                .await
                .unwrap();
            store
                .add("assessments", doc(json!({"studentId": "s1"})))
                .await
                .unwrap();
        }

        {
            let store = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();
            let student = store.get("students", "s1").await.unwrap().unwrap();
            assert_eq!(student.get("parentId"), Some(&json!("p1")));
            assert_eq!(store.list("assessments").await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_update_does_not_create_file() {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();

        assert!(store.update("students", "missing", Document::new()).await.is_err());
        assert!(!store.file_path().exists());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_untouched() {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();
        store
            .set_merge("students", "s1", doc(json!({"assessmentStatus": "in_progress"})))
            .await
            .unwrap();

        // A directory where the file should be makes every write fail.
        std::fs::remove_file(store.file_path()).unwrap();
        std::fs::create_dir(store.file_path()).unwrap();

        let result = store
            .update("students", "s1", doc(json!({"assessmentStatus": "completed"})))
            .await;
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.add("assessments", doc(json!({"n": 1}))).await.is_err());

        let student = store.get("students", "s1").await.unwrap().unwrap();
        assert_eq!(student["assessmentStatus"], json!("in_progress"));
        assert!(store.list("assessments").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_all_persisted() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(JsonFileDocumentStore::load(temp_dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for n in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add("assessments", doc(json!({"n": n})))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reloaded = JsonFileDocumentStore::load(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.list("assessments").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join(DOCUMENTS_FILE), "not json").unwrap();

        let result = JsonFileDocumentStore::load(temp_dir.path()).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
