//! Durable write intents for the remote document store.
//!
//! Every local mutation that must also reach the remote store writes one
//! outbox row in the same transaction as the cache write. The row is the
//! single source of the remote intent: it is pushed immediately after the
//! local commit and retried by the periodic pusher until the remote
//! confirms or the entry is dead-lettered.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::Result;
use crate::remote::FieldMap;

/// Remote operation carried by an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxOp {
    /// Full-document overwrite; payload is the document.
    Set,
    /// Partial field update; payload is the field map.
    Patch,
    /// Server-side counter increment; payload is `{ "field": ..., "delta": ... }`.
    Increment,
}

/// Outbox entry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Dead,
}

/// One durable remote-write intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub event_id: String,
    pub collection: String,
    pub document_id: String,
    pub op: OutboxOp,
    pub payload: Value,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// Request used by cache stores when enqueueing an intent alongside a local
/// write. The event id is assigned here so retries stay idempotent.
#[derive(Debug, Clone)]
pub struct OutboxWriteRequest {
    pub event_id: String,
    pub collection: String,
    pub document_id: String,
    pub op: OutboxOp,
    pub payload: Value,
    pub created_at: String,
}

impl OutboxWriteRequest {
    pub fn set(collection: &str, document_id: impl Into<String>, document: Value) -> Self {
        Self::new(collection, document_id, OutboxOp::Set, document)
    }

    pub fn patch(collection: &str, document_id: impl Into<String>, fields: FieldMap) -> Self {
        Self::new(collection, document_id, OutboxOp::Patch, Value::Object(fields))
    }

    pub fn increment(collection: &str, document_id: impl Into<String>, field: &str) -> Self {
        Self::new(
            collection,
            document_id,
            OutboxOp::Increment,
            serde_json::json!({ "field": field, "delta": 1 }),
        )
    }

    fn new(collection: &str, document_id: impl Into<String>, op: OutboxOp, payload: Value) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            collection: collection.to_string(),
            document_id: document_id.into(),
            op,
            payload,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

impl OutboxEntry {
    /// View of a just-enqueued request, used for the immediate push attempt
    /// right after the local transaction commits.
    pub fn from_request(req: &OutboxWriteRequest) -> Self {
        Self {
            event_id: req.event_id.clone(),
            collection: req.collection.clone(),
            document_id: req.document_id.clone(),
            op: req.op,
            payload: req.payload.clone(),
            status: OutboxStatus::Pending,
            retry_count: 0,
            next_retry_at: None,
            last_error: None,
            created_at: req.created_at.clone(),
        }
    }
}

/// Storage-side view of the outbox table.
#[async_trait]
pub trait OutboxQueue: Send + Sync {
    /// Pending entries whose retry time has passed, oldest first.
    fn list_due(&self, limit: i64) -> Result<Vec<OutboxEntry>>;

    async fn mark_sent(&self, event_ids: Vec<String>) -> Result<()>;

    async fn schedule_retry(
        &self,
        event_ids: Vec<String>,
        backoff_seconds: i64,
        last_error: Option<String>,
    ) -> Result<()>;

    async fn mark_dead(&self, event_ids: Vec<String>, last_error: Option<String>) -> Result<()>;
}

/// Typed result of a dual-store write (local cache + remote document store).
///
/// `update`-style operations commit locally first; the remote side either
/// confirmed inline or stays pending in the outbox. Callers that care can
/// reconcile; callers that do not can ignore the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Local cache and remote store both confirmed.
    BothCommitted,
    /// Local cache committed; the remote write failed and was left pending
    /// in the outbox for retry. The two stores diverge until a push or a
    /// sync heals them.
    LocalCommitted { remote_error: String },
}

impl WriteOutcome {
    pub fn is_fully_committed(&self) -> bool {
        matches!(self, Self::BothCommitted)
    }
}
