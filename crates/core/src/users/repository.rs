use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::Result;
use crate::observe::live_query;
use crate::remote::{collections, DocumentStore, FieldMap};
use crate::sync::{OutboxPusher, OutboxWriteRequest, WriteOutcome};
use crate::utils::now_millis;

use super::{User, UserCache};

/// User accounts over the local cache and the remote `users` collection.
///
/// Reads come from the cache, with a remote point-read fallback on miss.
/// `create` is remote-first: nothing is cached unless the remote accepted
/// the document. Everything else commits locally with a durable outbox
/// intent, then attempts one immediate push.
pub struct UserRepository {
    cache: Arc<dyn UserCache>,
    remote: Arc<dyn DocumentStore>,
    pusher: Arc<OutboxPusher>,
}

impl UserRepository {
    pub fn new(
        cache: Arc<dyn UserCache>,
        remote: Arc<dyn DocumentStore>,
        pusher: Arc<OutboxPusher>,
    ) -> Self {
        Self {
            cache,
            remote,
            pusher,
        }
    }

    /// Cached lookup with a remote fallback on miss; a remote hit is cached
    /// before returning.
    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        if let Some(user) = self.cache.get_by_id(user_id)? {
            return Ok(Some(user));
        }
        self.sync_from_remote(user_id).await
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.cache.get_by_email(email)
    }

    pub fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>> {
        self.cache.get_by_student_id(student_id)
    }

    pub fn observe_all(&self) -> watch::Receiver<Vec<User>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_all())
    }

    /// Remote-first create: the cache is only written once the remote store
    /// accepted the document.
    pub async fn create(&self, user: &User) -> Result<()> {
        let doc = serde_json::to_value(user)?;
        self.remote.set(collections::USERS, &user.id, doc).await?;
        self.cache.upsert(user.clone()).await
    }

    /// Full-profile update: local row plus outbox intent in one transaction,
    /// then one immediate push attempt.
    pub async fn update(&self, user: &User) -> Result<WriteOutcome> {
        let intent =
            OutboxWriteRequest::set(collections::USERS, &user.id, serde_json::to_value(user)?);
        self.cache.update(user.clone(), intent.clone()).await?;
        self.pusher.push_request(&intent).await
    }

    pub async fn update_last_active(&self, user_id: &str) -> Result<WriteOutcome> {
        let timestamp = now_millis();
        let mut fields = FieldMap::new();
        fields.insert("lastActive".to_string(), Value::from(timestamp));
        let intent = OutboxWriteRequest::patch(collections::USERS, user_id, fields);
        self.cache
            .set_last_active(user_id, timestamp, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    /// Remote point-read, caching the document on success. `Ok(None)` when
    /// the remote has no such user.
    pub async fn sync_from_remote(&self, user_id: &str) -> Result<Option<User>> {
        match self.remote.get(collections::USERS, user_id).await? {
            Some(doc) => {
                let user: User = serde_json::from_value(doc)?;
                self.cache.upsert(user.clone()).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Drop the cached account, e.g. on sign-out. The remote document is
    /// untouched.
    pub async fn delete_local(&self, user_id: &str) -> Result<()> {
        self.cache.delete_by_id(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryDocumentStore;
    use crate::sync::{OutboxEntry, OutboxQueue};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    /// Map-backed cache standing in for the SQLite store.
    struct MemUserCache {
        rows: Mutex<BTreeMap<String, User>>,
        changed: broadcast::Sender<()>,
    }

    impl MemUserCache {
        fn new() -> Self {
            let (changed, _) = broadcast::channel(16);
            Self {
                rows: Mutex::new(BTreeMap::new()),
                changed,
            }
        }
    }

    #[async_trait::async_trait]
    impl UserCache for MemUserCache {
        fn get_by_id(&self, id: &str) -> Result<Option<User>> {
            Ok(self.rows.lock().unwrap().get(id).cloned())
        }

        fn get_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.student_id == student_id)
                .cloned())
        }

        fn list_all(&self) -> Result<Vec<User>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        fn changes(&self) -> broadcast::Receiver<()> {
            self.changed.subscribe()
        }

        async fn upsert(&self, user: User) -> Result<()> {
            self.rows.lock().unwrap().insert(user.id.clone(), user);
            let _ = self.changed.send(());
            Ok(())
        }

        async fn upsert_many(&self, users: Vec<User>) -> Result<()> {
            for user in users {
                self.rows.lock().unwrap().insert(user.id.clone(), user);
            }
            let _ = self.changed.send(());
            Ok(())
        }

        async fn update(&self, user: User, _intent: OutboxWriteRequest) -> Result<()> {
            self.upsert(user).await
        }

        async fn set_last_active(
            &self,
            id: &str,
            timestamp: i64,
            _intent: OutboxWriteRequest,
        ) -> Result<()> {
            if let Some(user) = self.rows.lock().unwrap().get_mut(id) {
                user.last_active = timestamp;
            }
            let _ = self.changed.send(());
            Ok(())
        }

        async fn delete_by_id(&self, id: &str) -> Result<()> {
            self.rows.lock().unwrap().remove(id);
            let _ = self.changed.send(());
            Ok(())
        }
    }

    /// Queue that accepts everything; push bookkeeping is covered elsewhere.
    struct NullQueue;

    #[async_trait::async_trait]
    impl OutboxQueue for NullQueue {
        fn list_due(&self, _limit: i64) -> Result<Vec<OutboxEntry>> {
            Ok(Vec::new())
        }

        async fn mark_sent(&self, _event_ids: Vec<String>) -> Result<()> {
            Ok(())
        }

        async fn schedule_retry(
            &self,
            _event_ids: Vec<String>,
            _backoff_seconds: i64,
            _last_error: Option<String>,
        ) -> Result<()> {
            Ok(())
        }

        async fn mark_dead(
            &self,
            _event_ids: Vec<String>,
            _last_error: Option<String>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn repository(remote: Arc<MemoryDocumentStore>) -> (UserRepository, Arc<MemUserCache>) {
        let cache = Arc::new(MemUserCache::new());
        let pusher = Arc::new(OutboxPusher::new(Arc::new(NullQueue), remote.clone()));
        (
            UserRepository::new(cache.clone(), remote, pusher),
            cache,
        )
    }

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            email: "jane@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Mwangi".into(),
            ..User::default()
        }
    }

    #[tokio::test]
    async fn create_writes_remote_then_cache() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let (repo, cache) = repository(remote.clone());

        repo.create(&sample_user()).await.unwrap();

        assert!(remote.document("users", "u1").is_some());
        assert!(cache.get_by_id("u1").unwrap().is_some());
    }

    #[tokio::test]
    async fn create_against_offline_remote_leaves_cache_untouched() {
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        let (repo, cache) = repository(remote);

        assert!(repo.create(&sample_user()).await.is_err());
        assert!(cache.get_by_id("u1").unwrap().is_none());
    }

    #[tokio::test]
    async fn update_against_offline_remote_commits_locally() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let (repo, cache) = repository(remote.clone());
        repo.create(&sample_user()).await.unwrap();

        remote.set_offline(true);
        let mut user = sample_user();
        user.course = "Computer Science".into();
        let outcome = repo.update(&user).await.unwrap();

        assert!(matches!(outcome, WriteOutcome::LocalCommitted { .. }));
        assert_eq!(
            cache.get_by_id("u1").unwrap().unwrap().course,
            "Computer Science"
        );
    }

    #[tokio::test]
    async fn get_by_id_falls_back_to_remote_and_caches() {
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.put_document(
            "users",
            "u9",
            serde_json::to_value(User {
                id: "u9".into(),
                email: "remote@example.com".into(),
                ..User::default()
            })
            .unwrap(),
        );
        let (repo, cache) = repository(remote);

        let user = repo.get_by_id("u9").await.unwrap().unwrap();
        assert_eq!(user.email, "remote@example.com");
        assert!(cache.get_by_id("u9").unwrap().is_some());
    }
}
