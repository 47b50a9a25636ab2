//! In-process document store

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Document, DocumentStore};
use crate::StoreError;

pub(crate) type Collections = HashMap<String, HashMap<String, Document>>;

/// Merge `fields` into an existing document.
pub(crate) fn apply_update(
    collections: &mut Collections,
    collection: &str,
    id: &str,
    fields: Document,
) -> Result<(), StoreError> {
    let doc = collections
        .get_mut(collection)
        .and_then(|docs| docs.get_mut(id))
        .ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
    doc.extend(fields);
    Ok(())
}

/// Merge `fields` into a document, creating it if needed.
pub(crate) fn apply_set_merge(
    collections: &mut Collections,
    collection: &str,
    id: &str,
    fields: Document,
) {
    collections
        .entry(collection.to_string())
        .or_default()
        .entry(id.to_string())
        .or_default()
        .extend(fields);
}

/// Insert a document under a fresh id.
pub(crate) fn apply_add(collections: &mut Collections, collection: &str, document: Document) -> String {
    let id = Uuid::new_v4().to_string();
    collections
        .entry(collection.to_string())
        .or_default()
        .insert(id.clone(), document);
    id
}

/// Document store held in memory. Counts successful writes so callers can
/// assert that an operation performed none.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
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
        let mut collections = self.collections.write().await;
        apply_update(&mut collections, collection, id, fields)?;
        self.record_write();
        Ok(())
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        apply_set_merge(&mut collections, collection, id, fields);
        self.record_write();
        Ok(())
    }

    async fn add(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        let id = apply_add(&mut collections, collection, document);
        self.record_write();
        Ok(id)
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
