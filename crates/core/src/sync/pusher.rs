//! Outbox push engine: applies pending intents to the remote store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;

use crate::errors::{RemoteError, RemoteRetryClass, Result};
use crate::remote::{DocumentStore, FieldMap};

use super::{OutboxEntry, OutboxOp, OutboxQueue, WriteOutcome};

/// Base backoff between outbox retries.
pub const OUTBOX_RETRY_BASE_SECS: i64 = 2;

/// Backoff ceiling.
pub const OUTBOX_RETRY_MAX_SECS: i64 = 300;

/// Attempts before an entry is dead-lettered.
pub const OUTBOX_MAX_ATTEMPTS: i32 = 8;

/// Entries drained per push cycle.
pub const OUTBOX_PUSH_BATCH: i64 = 64;

/// Default cadence of the periodic pusher.
pub const OUTBOX_PUSH_INTERVAL_SECS: u64 = 30;

/// Exponential backoff for the given retry count, capped.
pub fn retry_backoff_seconds(retry_count: i32) -> i64 {
    let exp = retry_count.clamp(0, 16) as u32;
    (OUTBOX_RETRY_BASE_SECS << exp.min(8)).min(OUTBOX_RETRY_MAX_SECS)
}

/// Applies outbox entries to the remote store and records the result.
///
/// Shared by the repositories (one immediate push after each local commit)
/// and the periodic drain cycle.
pub struct OutboxPusher {
    queue: Arc<dyn OutboxQueue>,
    remote: Arc<dyn DocumentStore>,
}

impl OutboxPusher {
    pub fn new(queue: Arc<dyn OutboxQueue>, remote: Arc<dyn DocumentStore>) -> Self {
        Self { queue, remote }
    }

    /// Push one entry now. On failure the entry is rescheduled (or
    /// dead-lettered) and the error is folded into the returned outcome.
    pub async fn push_entry(&self, entry: &OutboxEntry) -> Result<WriteOutcome> {
        match self.apply(entry).await {
            Ok(()) => {
                self.queue.mark_sent(vec![entry.event_id.clone()]).await?;
                Ok(WriteOutcome::BothCommitted)
            }
            Err(err) => {
                let message = err.to_string();
                let permanent = matches!(
                    err.remote_retry_class(),
                    Some(RemoteRetryClass::Permanent)
                );
                if permanent || entry.retry_count + 1 >= OUTBOX_MAX_ATTEMPTS {
                    warn!(
                        "outbox entry {} for {}/{} dead-lettered: {}",
                        entry.event_id, entry.collection, entry.document_id, message
                    );
                    self.queue
                        .mark_dead(vec![entry.event_id.clone()], Some(message.clone()))
                        .await?;
                } else {
                    debug!(
                        "outbox entry {} for {}/{} rescheduled after failure: {}",
                        entry.event_id, entry.collection, entry.document_id, message
                    );
                    self.queue
                        .schedule_retry(
                            vec![entry.event_id.clone()],
                            retry_backoff_seconds(entry.retry_count),
                            Some(message.clone()),
                        )
                        .await?;
                }
                Ok(WriteOutcome::LocalCommitted {
                    remote_error: message,
                })
            }
        }
    }

    /// Immediate push of a freshly committed intent.
    pub async fn push_request(&self, req: &super::OutboxWriteRequest) -> Result<WriteOutcome> {
        self.push_entry(&OutboxEntry::from_request(req)).await
    }

    /// Immediate push of a group of freshly committed patch intents as one
    /// batched remote call per collection. Each group confirms, reschedules,
    /// or dead-letters together. Used for read receipts, where one local
    /// transaction produces an intent per message.
    pub async fn push_patch_batch(
        &self,
        reqs: &[super::OutboxWriteRequest],
    ) -> Result<WriteOutcome> {
        if reqs.is_empty() {
            return Ok(WriteOutcome::BothCommitted);
        }

        let mut groups: BTreeMap<&str, Vec<&super::OutboxWriteRequest>> = BTreeMap::new();
        for req in reqs {
            if req.op != OutboxOp::Patch {
                return Err(RemoteError::InvalidRequest(format!(
                    "only patch intents can be batched, got {:?}",
                    req.op
                ))
                .into());
            }
            groups.entry(req.collection.as_str()).or_default().push(req);
        }

        let mut first_error: Option<String> = None;
        for (collection, group) in groups {
            let mut updates = Vec::with_capacity(group.len());
            for req in &group {
                match &req.payload {
                    Value::Object(map) => updates.push((req.document_id.clone(), map.clone())),
                    other => {
                        return Err(RemoteError::InvalidRequest(format!(
                            "patch payload must be an object, got {}",
                            other
                        ))
                        .into())
                    }
                }
            }
            let event_ids: Vec<String> = group.iter().map(|r| r.event_id.clone()).collect();

            match self.remote.batch_update(collection, updates).await {
                Ok(()) => self.queue.mark_sent(event_ids).await?,
                Err(err) => {
                    let message = err.to_string();
                    let permanent = matches!(
                        err.remote_retry_class(),
                        Some(RemoteRetryClass::Permanent)
                    );
                    if permanent {
                        warn!(
                            "outbox batch of {} entries for {} dead-lettered: {}",
                            group.len(),
                            collection,
                            message
                        );
                        self.queue
                            .mark_dead(event_ids, Some(message.clone()))
                            .await?;
                    } else {
                        debug!(
                            "outbox batch of {} entries for {} rescheduled after failure: {}",
                            group.len(),
                            collection,
                            message
                        );
                        self.queue
                            .schedule_retry(
                                event_ids,
                                retry_backoff_seconds(0),
                                Some(message.clone()),
                            )
                            .await?;
                    }
                    first_error.get_or_insert(message);
                }
            }
        }

        Ok(match first_error {
            Some(remote_error) => WriteOutcome::LocalCommitted { remote_error },
            None => WriteOutcome::BothCommitted,
        })
    }

    /// Drain due pending entries, oldest first. Returns how many confirmed.
    pub async fn run_cycle(&self) -> Result<usize> {
        let due = self.queue.list_due(OUTBOX_PUSH_BATCH)?;
        if due.is_empty() {
            return Ok(0);
        }
        debug!("outbox push cycle: {} due entries", due.len());

        let mut confirmed = 0usize;
        for entry in &due {
            if self.push_entry(entry).await?.is_fully_committed() {
                confirmed += 1;
            }
        }
        Ok(confirmed)
    }

    async fn apply(&self, entry: &OutboxEntry) -> Result<()> {
        match entry.op {
            OutboxOp::Set => {
                self.remote
                    .set(&entry.collection, &entry.document_id, entry.payload.clone())
                    .await
            }
            OutboxOp::Patch => {
                let fields: FieldMap = match &entry.payload {
                    Value::Object(map) => map.clone(),
                    other => {
                        return Err(RemoteError::InvalidRequest(format!(
                            "patch payload must be an object, got {}",
                            other
                        ))
                        .into())
                    }
                };
                self.remote
                    .update(&entry.collection, &entry.document_id, fields)
                    .await
            }
            OutboxOp::Increment => {
                let field = entry
                    .payload
                    .get("field")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        RemoteError::InvalidRequest("increment payload missing field".into())
                    })?;
                let delta = entry
                    .payload
                    .get("delta")
                    .and_then(Value::as_i64)
                    .unwrap_or(1);
                self.remote
                    .increment(&entry.collection, &entry.document_id, field, delta)
                    .await
            }
        }
    }

    /// Run push cycles forever on a fixed cadence. The task ends when the
    /// handle returned by [`tokio::spawn`] is aborted or dropped by the
    /// owning context.
    pub async fn run_periodic(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(0) => {}
                Ok(n) => debug!("outbox push cycle confirmed {} entries", n),
                Err(err) => warn!("outbox push cycle failed: {}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryDocumentStore;
    use crate::sync::{OutboxStatus, OutboxWriteRequest};
    use std::sync::Mutex;

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(retry_backoff_seconds(0), 2);
        assert_eq!(retry_backoff_seconds(1), 4);
        assert_eq!(retry_backoff_seconds(4), 32);
        assert_eq!(retry_backoff_seconds(12), OUTBOX_RETRY_MAX_SECS);
    }

    /// Minimal in-memory queue mirroring the storage crate's behavior.
    #[derive(Default)]
    struct MemQueue {
        entries: Mutex<Vec<OutboxEntry>>,
    }

    impl MemQueue {
        fn enqueue(&self, req: OutboxWriteRequest) -> OutboxEntry {
            let entry = OutboxEntry {
                event_id: req.event_id,
                collection: req.collection,
                document_id: req.document_id,
                op: req.op,
                payload: req.payload,
                status: OutboxStatus::Pending,
                retry_count: 0,
                next_retry_at: None,
                last_error: None,
                created_at: req.created_at,
            };
            self.entries.lock().unwrap().push(entry.clone());
            entry
        }

        fn status_of(&self, event_id: &str) -> OutboxStatus {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.event_id == event_id)
                .map(|e| e.status)
                .expect("entry")
        }
    }

    #[async_trait::async_trait]
    impl OutboxQueue for MemQueue {
        fn list_due(&self, limit: i64) -> Result<Vec<OutboxEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.status == OutboxStatus::Pending)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn mark_sent(&self, event_ids: Vec<String>) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            for entry in entries.iter_mut() {
                if event_ids.contains(&entry.event_id) {
                    entry.status = OutboxStatus::Sent;
                }
            }
            Ok(())
        }

        async fn schedule_retry(
            &self,
            event_ids: Vec<String>,
            _backoff_seconds: i64,
            last_error: Option<String>,
        ) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            for entry in entries.iter_mut() {
                if event_ids.contains(&entry.event_id) {
                    entry.retry_count += 1;
                    entry.last_error = last_error.clone();
                }
            }
            Ok(())
        }

        async fn mark_dead(&self, event_ids: Vec<String>, last_error: Option<String>) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            for entry in entries.iter_mut() {
                if event_ids.contains(&entry.event_id) {
                    entry.status = OutboxStatus::Dead;
                    entry.last_error = last_error.clone();
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn push_confirms_set_entry_against_remote() {
        let queue = Arc::new(MemQueue::default());
        let remote = Arc::new(MemoryDocumentStore::new());
        let pusher = OutboxPusher::new(queue.clone(), remote.clone());

        let entry = queue.enqueue(OutboxWriteRequest::set(
            "counselors",
            "c1",
            serde_json::json!({ "id": "c1", "isAvailable": true }),
        ));
        let outcome = pusher.push_entry(&entry).await.unwrap();

        assert_eq!(outcome, WriteOutcome::BothCommitted);
        assert_eq!(queue.status_of(&entry.event_id), OutboxStatus::Sent);
        assert_eq!(
            remote.document("counselors", "c1").unwrap()["isAvailable"],
            true
        );
    }

    #[tokio::test]
    async fn push_against_offline_remote_leaves_entry_pending() {
        let queue = Arc::new(MemQueue::default());
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        let pusher = OutboxPusher::new(queue.clone(), remote.clone());

        let entry = queue.enqueue(OutboxWriteRequest::increment("resources", "r1", "likes"));
        let outcome = pusher.push_entry(&entry).await.unwrap();

        assert!(matches!(outcome, WriteOutcome::LocalCommitted { .. }));
        assert_eq!(queue.status_of(&entry.event_id), OutboxStatus::Pending);
    }

    #[tokio::test]
    async fn permanent_failure_dead_letters_the_entry() {
        let queue = Arc::new(MemQueue::default());
        // Patch against a missing document is a 404: permanent.
        let remote = Arc::new(MemoryDocumentStore::new());
        let pusher = OutboxPusher::new(queue.clone(), remote);

        let mut fields = FieldMap::new();
        fields.insert("isRead".into(), serde_json::Value::Bool(true));
        let entry = queue.enqueue(OutboxWriteRequest::patch("chat_messages", "ghost", fields));
        let outcome = pusher.push_entry(&entry).await.unwrap();

        assert!(matches!(outcome, WriteOutcome::LocalCommitted { .. }));
        assert_eq!(queue.status_of(&entry.event_id), OutboxStatus::Dead);
    }

    #[tokio::test]
    async fn batched_patches_confirm_together() {
        let queue = Arc::new(MemQueue::default());
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.put_document(
            "chat_messages",
            "m1",
            serde_json::json!({ "id": "m1", "isRead": false }),
        );
        remote.put_document(
            "chat_messages",
            "m2",
            serde_json::json!({ "id": "m2", "isRead": false }),
        );
        let pusher = OutboxPusher::new(queue.clone(), remote.clone());

        let mut fields = FieldMap::new();
        fields.insert("isRead".into(), serde_json::Value::Bool(true));
        let reqs: Vec<_> = ["m1", "m2"]
            .iter()
            .map(|id| OutboxWriteRequest::patch("chat_messages", *id, fields.clone()))
            .collect();
        for req in &reqs {
            queue.enqueue(req.clone());
        }

        let outcome = pusher.push_patch_batch(&reqs).await.unwrap();

        assert_eq!(outcome, WriteOutcome::BothCommitted);
        for req in &reqs {
            assert_eq!(queue.status_of(&req.event_id), OutboxStatus::Sent);
        }
        assert_eq!(remote.document("chat_messages", "m1").unwrap()["isRead"], true);
        assert_eq!(remote.document("chat_messages", "m2").unwrap()["isRead"], true);
    }

    #[tokio::test]
    async fn batched_patches_against_offline_remote_stay_pending() {
        let queue = Arc::new(MemQueue::default());
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        let pusher = OutboxPusher::new(queue.clone(), remote);

        let mut fields = FieldMap::new();
        fields.insert("isRead".into(), serde_json::Value::Bool(true));
        let req = OutboxWriteRequest::patch("chat_messages", "m1", fields);
        queue.enqueue(req.clone());

        let outcome = pusher.push_patch_batch(std::slice::from_ref(&req)).await.unwrap();

        assert!(matches!(outcome, WriteOutcome::LocalCommitted { .. }));
        assert_eq!(queue.status_of(&req.event_id), OutboxStatus::Pending);
    }

    #[tokio::test]
    async fn cycle_drains_pending_entries_after_recovery() {
        let queue = Arc::new(MemQueue::default());
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.put_document("resources", "r1", serde_json::json!({ "id": "r1", "likes": 0 }));
        remote.set_offline(true);
        let pusher = OutboxPusher::new(queue.clone(), remote.clone());

        let entry = queue.enqueue(OutboxWriteRequest::increment("resources", "r1", "likes"));
        pusher.push_entry(&entry).await.unwrap();
        assert_eq!(queue.status_of(&entry.event_id), OutboxStatus::Pending);

        remote.set_offline(false);
        let confirmed = pusher.run_cycle().await.unwrap();
        assert_eq!(confirmed, 1);
        assert_eq!(queue.status_of(&entry.event_id), OutboxStatus::Sent);
        assert_eq!(remote.document("resources", "r1").unwrap()["likes"], 1);
    }
}
