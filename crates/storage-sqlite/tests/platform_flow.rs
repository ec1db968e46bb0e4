//! End-to-end flows over real SQLite stores, the core repositories, and an
//! in-memory remote document store.

use std::sync::Arc;

use tempfile::{tempdir, TempDir};

use tulia_core::appointments::{Appointment, AppointmentRepository, AppointmentStatus};
use tulia_core::chat::{ChatMessage, ChatRepository, ChatSession, SenderKind};
use tulia_core::counselors::{Counselor, CounselorRepository};
use tulia_core::remote::MemoryDocumentStore;
use tulia_core::resources::{Resource, ResourceRepository};
use tulia_core::sync::{OutboxPusher, OutboxQueue, WriteOutcome};
use tulia_core::users::{User, UserRepository};
use tulia_storage_sqlite::db::DbPool;
use tulia_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, AppointmentStore, ChatStore, CounselorStore,
    OutboxStore, ResourceStore, UserStore, WriteHandle,
};

struct Ctx {
    pool: DbPool,
    writer: WriteHandle,
    remote: Arc<MemoryDocumentStore>,
    outbox: Arc<OutboxStore>,
    pusher: Arc<OutboxPusher>,
    // Cleaned up when the test context drops; fields above go first.
    _data_dir: TempDir,
}

fn setup() -> Ctx {
    let data_dir = tempdir().expect("tempdir");
    let db_path = init(data_dir.path().to_str().expect("utf8 path")).expect("init data dir");
    run_migrations(&db_path).expect("migrations");
    let pool = create_pool(&db_path).expect("pool");
    let writer = spawn_writer(pool.as_ref().clone());

    let remote = Arc::new(MemoryDocumentStore::new());
    let outbox = Arc::new(OutboxStore::new(pool.clone(), writer.clone()));
    let pusher = Arc::new(OutboxPusher::new(outbox.clone(), remote.clone()));

    Ctx {
        pool,
        writer,
        remote,
        outbox,
        pusher,
        _data_dir: data_dir,
    }
}

impl Ctx {
    fn users(&self) -> (UserRepository, Arc<UserStore>) {
        let store = Arc::new(UserStore::new(self.pool.clone(), self.writer.clone()));
        (
            UserRepository::new(store.clone(), self.remote.clone(), self.pusher.clone()),
            store,
        )
    }

    fn counselors(&self) -> (CounselorRepository, Arc<CounselorStore>) {
        let store = Arc::new(CounselorStore::new(self.pool.clone(), self.writer.clone()));
        (
            CounselorRepository::new(store.clone(), self.remote.clone(), self.pusher.clone()),
            store,
        )
    }

    fn appointments(&self) -> (AppointmentRepository, Arc<AppointmentStore>) {
        let store = Arc::new(AppointmentStore::new(self.pool.clone(), self.writer.clone()));
        (
            AppointmentRepository::new(store.clone(), self.remote.clone(), self.pusher.clone()),
            store,
        )
    }

    fn resources(&self) -> (ResourceRepository, Arc<ResourceStore>) {
        let store = Arc::new(ResourceStore::new(self.pool.clone(), self.writer.clone()));
        (
            ResourceRepository::new(store.clone(), self.remote.clone(), self.pusher.clone()),
            store,
        )
    }

    fn chat(&self) -> (ChatRepository, Arc<ChatStore>) {
        let store = Arc::new(ChatStore::new(self.pool.clone(), self.writer.clone()));
        (
            ChatRepository::new(store.clone(), self.remote.clone(), self.pusher.clone()),
            store,
        )
    }
}

fn sample_counselor(id: &str) -> Counselor {
    Counselor {
        id: id.into(),
        first_name: "Grace".into(),
        last_name: "Otieno".into(),
        email: "grace@campus.ac.ke".into(),
        specializations: vec!["Anxiety".into(), "Academic Pressure".into()],
        languages: vec!["English".into(), "Swahili".into()],
        is_available: true,
        rating: 4.7,
        ..Counselor::default()
    }
}

fn sample_resource(id: &str, likes: i32) -> Resource {
    Resource {
        id: id.into(),
        title: "Managing exam stress".into(),
        description: "Short practical techniques".into(),
        tags: vec!["exams".into(), "stress".into()],
        likes,
        ..Resource::default()
    }
}

fn sample_message(id: &str, chat_id: &str, sender_id: &str, timestamp: i64) -> ChatMessage {
    ChatMessage {
        id: id.into(),
        chat_id: chat_id.into(),
        sender_id: sender_id.into(),
        sender_name: "Someone".into(),
        sender_kind: if sender_id.starts_with('c') {
            SenderKind::Counselor
        } else {
            SenderKind::Student
        },
        body: format!("message {id}"),
        timestamp,
        ..ChatMessage::default()
    }
}

#[tokio::test]
async fn synced_remote_documents_read_back_identically() {
    let ctx = setup();
    let (repo, store) = ctx.counselors();

    let counselor = sample_counselor("c1");
    ctx.remote.put_document(
        "counselors",
        "c1",
        serde_json::to_value(&counselor).unwrap(),
    );

    let fetched = repo.sync_from_remote().await.unwrap();
    assert_eq!(fetched.len(), 1);

    use tulia_core::counselors::CounselorCache;
    let cached = store.get_by_id("c1").unwrap().unwrap();
    assert_eq!(cached, counselor);
}

#[tokio::test]
async fn confirming_an_appointment_patches_cache_and_remote() {
    let ctx = setup();
    let (repo, _store) = ctx.appointments();

    let appointment = Appointment {
        id: "a1".into(),
        user_id: "u1".into(),
        counselor_id: "c1".into(),
        title: "Intro session".into(),
        scheduled_date_time: 1_800_000_000_000,
        updated_at: 0,
        ..Appointment::default()
    };
    repo.create(&appointment).await.unwrap();

    let outcome = repo.confirm("a1").await.unwrap();
    assert_eq!(outcome, WriteOutcome::BothCommitted);

    let cached = repo.get_by_id("a1").unwrap().unwrap();
    assert_eq!(cached.status, AppointmentStatus::Confirmed);
    assert!(cached.updated_at > 0);

    let doc = ctx.remote.document("appointments", "a1").unwrap();
    assert_eq!(doc["status"], "CONFIRMED");
    assert_eq!(doc["updatedAt"], cached.updated_at);
}

#[tokio::test]
async fn messages_read_back_in_timestamp_order() {
    let ctx = setup();
    let (repo, _store) = ctx.chat();

    for (id, ts) in [("m1", 100i64), ("m2", 300), ("m3", 200)] {
        ctx.remote.put_document(
            "chat_messages",
            id,
            serde_json::to_value(sample_message(id, "chat1", "c9", ts)).unwrap(),
        );
    }

    let synced = repo.sync_messages_from_remote("chat1").await.unwrap();
    assert_eq!(
        synced.iter().map(|m| m.timestamp).collect::<Vec<_>>(),
        vec![100, 200, 300]
    );

    let rx = repo.observe_messages("chat1");
    let listed: Vec<i64> = rx.borrow().iter().map(|m| m.timestamp).collect();
    assert_eq!(listed, vec![100, 200, 300]);
}

#[tokio::test]
async fn repeated_likes_accumulate_locally_and_remotely() {
    let ctx = setup();
    let (repo, store) = ctx.resources();

    let resource = sample_resource("r1", 4);
    ctx.remote
        .put_document("resources", "r1", serde_json::to_value(&resource).unwrap());
    use tulia_core::resources::ResourceCache;
    store.upsert(resource).await.unwrap();

    for _ in 0..3 {
        let outcome = repo.increment_likes("r1").await.unwrap();
        assert_eq!(outcome, WriteOutcome::BothCommitted);
    }

    assert_eq!(repo.get_by_id("r1").unwrap().unwrap().likes, 7);
    assert_eq!(ctx.remote.document("resources", "r1").unwrap()["likes"], 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_likes_are_never_lost() {
    let ctx = setup();
    let (repo, store) = ctx.resources();
    let repo = Arc::new(repo);

    let resource = sample_resource("r1", 5);
    ctx.remote
        .put_document("resources", "r1", serde_json::to_value(&resource).unwrap());
    use tulia_core::resources::ResourceCache;
    store.upsert(resource).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(
            async move { repo.increment_likes("r1").await },
        ));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), WriteOutcome::BothCommitted);
    }

    assert_eq!(repo.get_by_id("r1").unwrap().unwrap().likes, 25);
    assert_eq!(ctx.remote.document("resources", "r1").unwrap()["likes"], 25);
}

#[tokio::test]
async fn mark_read_only_touches_other_senders_messages() {
    let ctx = setup();
    let (repo, store) = ctx.chat();

    let from_counselor = sample_message("m1", "chat1", "c9", 100);
    let own = sample_message("m2", "chat1", "stu1", 200);
    let mut already_read = sample_message("m3", "chat1", "c9", 300);
    already_read.is_read = true;

    for message in [&from_counselor, &own, &already_read] {
        ctx.remote.put_document(
            "chat_messages",
            &message.id,
            serde_json::to_value(message).unwrap(),
        );
    }
    use tulia_core::chat::ChatCache;
    store
        .upsert_messages(vec![from_counselor, own, already_read])
        .await
        .unwrap();

    let outcome = repo.mark_messages_as_read("chat1", "stu1").await.unwrap();
    assert_eq!(outcome, WriteOutcome::BothCommitted);

    let messages = store.messages_by_chat("chat1").unwrap();
    assert!(messages.iter().find(|m| m.id == "m1").unwrap().is_read);
    assert!(!messages.iter().find(|m| m.id == "m2").unwrap().is_read);
    assert_eq!(repo.unread_messages_count("chat1", "stu1").unwrap(), 0);

    // Only the counselor's unread message was patched remotely.
    assert_eq!(
        ctx.remote.document("chat_messages", "m1").unwrap()["isRead"],
        true
    );
    assert_eq!(
        ctx.remote.document("chat_messages", "m2").unwrap()["isRead"],
        false
    );
}

#[tokio::test]
async fn offline_create_stores_nothing_anywhere() {
    let ctx = setup();
    let (repo, store) = ctx.users();
    ctx.remote.set_offline(true);

    let user = User {
        id: "u1".into(),
        email: "jane@campus.ac.ke".into(),
        ..User::default()
    };
    assert!(repo.create(&user).await.is_err());

    use tulia_core::users::UserCache;
    assert!(store.get_by_id("u1").unwrap().is_none());
    assert!(ctx.remote.document("users", "u1").is_none());
}

#[tokio::test]
async fn offline_availability_update_commits_locally_and_drains_later() {
    let ctx = setup();
    let (repo, store) = ctx.counselors();

    let counselor = sample_counselor("c1");
    ctx.remote.put_document(
        "counselors",
        "c1",
        serde_json::to_value(&counselor).unwrap(),
    );
    use tulia_core::counselors::CounselorCache;
    store.upsert(counselor).await.unwrap();

    ctx.remote.set_offline(true);
    let outcome = repo.update_availability("c1", false).await.unwrap();
    assert!(matches!(outcome, WriteOutcome::LocalCommitted { .. }));
    assert!(!store.get_by_id("c1").unwrap().unwrap().is_available);

    // The intent survived as a pending outbox row scheduled for retry.
    assert_eq!(ctx.outbox.pending_count().unwrap(), 1);

    // Once the remote is reachable again and the backoff has elapsed, a
    // push cycle heals the divergence.
    ctx.remote.set_offline(false);
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    let confirmed = ctx.pusher.run_cycle().await.unwrap();
    assert_eq!(confirmed, 1);
    assert_eq!(
        ctx.remote.document("counselors", "c1").unwrap()["isAvailable"],
        false
    );
    assert!(ctx.outbox.list_due(10).unwrap().is_empty());
}

#[tokio::test]
async fn sending_a_message_updates_the_session_preview() {
    let ctx = setup();
    let (repo, store) = ctx.chat();

    let session = ChatSession {
        id: "chat1".into(),
        user_id: "stu1".into(),
        counselor_id: "c9".into(),
        title: "Check-in".into(),
        ..ChatSession::default()
    };
    repo.create_session(&session).await.unwrap();

    let message = sample_message("m1", "chat1", "stu1", 500);
    let outcome = repo.send_message(&message).await.unwrap();
    assert_eq!(outcome, WriteOutcome::BothCommitted);

    use tulia_core::chat::ChatCache;
    let cached = store.session_by_id("chat1").unwrap().unwrap();
    assert_eq!(cached.last_message, "message m1");
    assert_eq!(cached.last_message_time, 500);

    let doc = ctx.remote.document("chat_sessions", "chat1").unwrap();
    assert_eq!(doc["lastMessage"], "message m1");
    assert_eq!(doc["lastMessageTime"], 500);
}

#[tokio::test]
async fn bookmark_survives_a_remote_sync() {
    let ctx = setup();
    let (repo, _store) = ctx.resources();

    ctx.remote.put_document(
        "resources",
        "r1",
        serde_json::to_value(sample_resource("r1", 0)).unwrap(),
    );
    repo.sync_from_remote().await.unwrap();

    repo.toggle_bookmark("r1", true).await.unwrap();

    let mut revised = sample_resource("r1", 0);
    revised.title = "Managing exam stress (revised)".into();
    ctx.remote
        .put_document("resources", "r1", serde_json::to_value(revised).unwrap());
    repo.sync_from_remote().await.unwrap();

    let cached = repo.get_by_id("r1").unwrap().unwrap();
    assert_eq!(cached.title, "Managing exam stress (revised)");
    assert!(cached.is_bookmarked);
}
