//! In-memory document store: useful for testing and ephemeral setups.

use async_trait::async_trait;
use hassist_core::error::StoreError;
use hassist_core::store::{DocumentKind, DocumentStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKind, serde_yaml::Value>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection.
    pub async fn insert(&self, kind: DocumentKind, document: serde_yaml::Value) {
        self.documents.write().await.insert(kind, document);
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, kind: DocumentKind) -> Result<Option<serde_yaml::Value>, StoreError> {
        Ok(self.documents.read().await.get(&kind).cloned())
    }

    async fn write(&self, kind: DocumentKind, document: &serde_yaml::Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path: kind.file_name().into(),
                reason: "write rejected".into(),
            });
        }
        self.documents.write().await.insert(kind, document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_write() {
        let store = InMemoryDocumentStore::new();
        assert!(store.read(DocumentKind::Scenes).await.unwrap().is_none());

        let doc = DocumentKind::Scenes.empty();
        store.write(DocumentKind::Scenes, &doc).await.unwrap();
        assert_eq!(store.read(DocumentKind::Scenes).await.unwrap(), Some(doc));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn failing_writes() {
        let store = InMemoryDocumentStore::new();
        store.fail_writes(true);
        assert!(store.write(DocumentKind::Scripts, &DocumentKind::Scripts.empty()).await.is_err());
        assert_eq!(store.writes(), 0);
    }
}
