//! Outbox table behavior against real SQLite.

use std::sync::Arc;

use serde_json::json;
use tempfile::{tempdir, TempDir};

use tulia_core::sync::{OutboxQueue, OutboxStatus, OutboxWriteRequest};
use tulia_storage_sqlite::db::DbPool;
use tulia_storage_sqlite::{
    create_pool, init, outbox::write_outbox_request, run_migrations, spawn_writer, OutboxStore,
    WriteHandle,
};

fn setup() -> (DbPool, WriteHandle, Arc<OutboxStore>, TempDir) {
    let data_dir = tempdir().expect("tempdir");
    let db_path = init(data_dir.path().to_str().expect("utf8 path")).expect("init data dir");
    run_migrations(&db_path).expect("migrations");
    let pool = create_pool(&db_path).expect("pool");
    let writer = spawn_writer(pool.as_ref().clone());
    let store = Arc::new(OutboxStore::new(pool.clone(), writer.clone()));
    (pool, writer, store, data_dir)
}

async fn enqueue(writer: &WriteHandle, request: OutboxWriteRequest) -> String {
    let event_id = request.event_id.clone();
    writer
        .exec(move |conn| write_outbox_request(conn, &request))
        .await
        .unwrap();
    event_id
}

#[tokio::test]
async fn due_entries_come_back_oldest_first() {
    let (_pool, writer, store, _data_dir) = setup();

    let mut first = OutboxWriteRequest::set("users", "u1", json!({ "id": "u1" }));
    first.created_at = "2026-01-01T00:00:00+00:00".to_string();
    let mut second = OutboxWriteRequest::set("users", "u2", json!({ "id": "u2" }));
    second.created_at = "2026-01-02T00:00:00+00:00".to_string();

    // Insert newest first to prove ordering comes from the column.
    let second_id = enqueue(&writer, second).await;
    let first_id = enqueue(&writer, first).await;

    let due = store.list_due(10).unwrap();
    assert_eq!(
        due.iter().map(|e| e.event_id.as_str()).collect::<Vec<_>>(),
        vec![first_id.as_str(), second_id.as_str()]
    );
}

#[tokio::test]
async fn sent_and_dead_entries_are_never_due() {
    let (_pool, writer, store, _data_dir) = setup();

    let sent = enqueue(
        &writer,
        OutboxWriteRequest::increment("resources", "r1", "likes"),
    )
    .await;
    let dead = enqueue(
        &writer,
        OutboxWriteRequest::increment("resources", "r2", "likes"),
    )
    .await;
    let pending = enqueue(
        &writer,
        OutboxWriteRequest::increment("resources", "r3", "likes"),
    )
    .await;

    store.mark_sent(vec![sent.clone()]).await.unwrap();
    store
        .mark_dead(vec![dead.clone()], Some("404".into()))
        .await
        .unwrap();

    let due = store.list_due(10).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].event_id, pending);

    assert_eq!(
        store.get_by_event_id(&sent).unwrap().unwrap().status,
        OutboxStatus::Sent
    );
    let dead_entry = store.get_by_event_id(&dead).unwrap().unwrap();
    assert_eq!(dead_entry.status, OutboxStatus::Dead);
    assert_eq!(dead_entry.last_error.as_deref(), Some("404"));
}

#[tokio::test]
async fn retry_scheduling_defers_and_counts() {
    let (_pool, writer, store, _data_dir) = setup();

    let event_id = enqueue(
        &writer,
        OutboxWriteRequest::set("appointments", "a1", json!({ "id": "a1" })),
    )
    .await;

    store
        .schedule_retry(vec![event_id.clone()], 60, Some("offline".into()))
        .await
        .unwrap();

    // Still pending, but not due for another minute.
    assert!(store.list_due(10).unwrap().is_empty());
    assert_eq!(store.pending_count().unwrap(), 1);

    let entry = store.get_by_event_id(&event_id).unwrap().unwrap();
    assert_eq!(entry.retry_count, 1);
    assert_eq!(entry.last_error.as_deref(), Some("offline"));
    assert!(entry.next_retry_at.is_some());
}
