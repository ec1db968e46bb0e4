//! Remote document store contract.
//!
//! The remote side of every repository is a cloud-hosted document collection
//! per entity kind, addressable by id. The trait mirrors exactly the surface
//! the repositories need: point read, full overwrite, partial update,
//! query-by-field, batched partial updates, and a server-side atomic counter
//! increment.

mod memory;

pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// Collection names, fixed by the backing document database.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COUNSELORS: &str = "counselors";
    pub const APPOINTMENTS: &str = "appointments";
    pub const RESOURCES: &str = "resources";
    pub const CHAT_SESSIONS: &str = "chat_sessions";
    pub const CHAT_MESSAGES: &str = "chat_messages";
}

/// Comparison operator for a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOp {
    Eq,
    NotEq,
    Gte,
    Lte,
}

/// One field predicate in a collection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: QueryOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: QueryOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, QueryOp::Eq, value)
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, QueryOp::NotEq, value)
    }
}

/// Partial-update field map: field name to new value.
pub type FieldMap = serde_json::Map<String, Value>;

/// Client for the cloud document store.
///
/// Implementations: the HTTP adapter in `tulia-remote`, and
/// [`MemoryDocumentStore`] for tests and local development.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `Ok(None)` when the document does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Full-document overwrite, creating the document if absent.
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// Partial update of named fields on an existing document.
    async fn update(&self, collection: &str, id: &str, fields: FieldMap) -> Result<()>;

    /// Query a collection; filters are ANDed.
    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Value>>;

    /// Batched partial updates, applied as one request.
    async fn batch_update(&self, collection: &str, updates: Vec<(String, FieldMap)>)
        -> Result<()>;

    /// Server-side atomic increment of a numeric field.
    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()>;
}

/// Evaluate one filter against a document. Shared by the memory store and by
/// filter tests; the HTTP backend evaluates server-side.
pub(crate) fn filter_matches(doc: &Value, filter: &FieldFilter) -> bool {
    let field = match doc.get(&filter.field) {
        Some(value) => value,
        None => return filter.op == QueryOp::NotEq && !filter.value.is_null(),
    };
    match filter.op {
        QueryOp::Eq => field == &filter.value,
        QueryOp::NotEq => field != &filter.value,
        QueryOp::Gte => compare(field, &filter.value)
            .map(|o| o.is_ge())
            .unwrap_or(false),
        QueryOp::Lte => compare(field, &filter.value)
            .map(|o| o.is_le())
            .unwrap_or(false),
    }
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_filter_matches_exact_value() {
        let doc = json!({ "status": "PENDING" });
        assert!(filter_matches(&doc, &FieldFilter::eq("status", "PENDING")));
        assert!(!filter_matches(&doc, &FieldFilter::eq("status", "CONFIRMED")));
    }

    #[test]
    fn not_eq_filter_matches_missing_field() {
        let doc = json!({ "chatId": "c1" });
        assert!(filter_matches(&doc, &FieldFilter::not_eq("senderId", "u1")));
    }

    #[test]
    fn range_filters_compare_numbers() {
        let doc = json!({ "timestamp": 200 });
        assert!(filter_matches(
            &doc,
            &FieldFilter::new("timestamp", QueryOp::Gte, 100)
        ));
        assert!(!filter_matches(
            &doc,
            &FieldFilter::new("timestamp", QueryOp::Lte, 100)
        ));
    }
}
