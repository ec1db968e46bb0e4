//! In-memory document store for tests and local development.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{RemoteError, Result};

use super::{filter_matches, DocumentStore, FieldFilter, FieldMap};

/// Mutex-guarded map of `(collection, id)` to document, with an `offline`
/// switch that makes every call fail the way a dead network would. Used to
/// exercise the repositories' divergence behavior without a server.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<(String, String), Value>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When offline, every operation returns a retryable transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Direct document access for test assertions.
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .expect("document map lock")
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    /// Seed a document without going through the store API.
    pub fn put_document(&self, collection: &str, id: &str, document: Value) {
        self.documents
            .lock()
            .expect("document map lock")
            .insert((collection.to_string(), id.to_string()), document);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("remote store is offline").into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.check_online()?;
        Ok(self.document(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        self.check_online()?;
        self.put_document(collection, id, document);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldMap) -> Result<()> {
        self.check_online()?;
        let mut documents = self.documents.lock().expect("document map lock");
        let key = (collection.to_string(), id.to_string());
        let doc = documents
            .get_mut(&key)
            .ok_or_else(|| RemoteError::api(404, format!("no document {}/{}", collection, id)))?;
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| RemoteError::InvalidRequest("document is not an object".into()))?;
        for (field, value) in fields {
            obj.insert(field, value);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Value>> {
        self.check_online()?;
        let documents = self.documents.lock().expect("document map lock");
        Ok(documents
            .iter()
            .filter(|((coll, _), _)| coll == collection)
            .map(|(_, doc)| doc)
            .filter(|doc| filters.iter().all(|f| filter_matches(doc, f)))
            .cloned()
            .collect())
    }

    async fn batch_update(
        &self,
        collection: &str,
        updates: Vec<(String, FieldMap)>,
    ) -> Result<()> {
        for (id, fields) in updates {
            self.update(collection, &id, fields).await?;
        }
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()> {
        self.check_online()?;
        let mut documents = self.documents.lock().expect("document map lock");
        let key = (collection.to_string(), id.to_string());
        let doc = documents
            .get_mut(&key)
            .ok_or_else(|| RemoteError::api(404, format!("no document {}/{}", collection, id)))?;
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| RemoteError::InvalidRequest("document is not an object".into()))?;
        let current = obj.get(field).and_then(Value::as_i64).unwrap_or(0);
        obj.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}
