use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::Result;
use crate::observe::live_query;
use crate::remote::{collections, DocumentStore};
use crate::sync::{OutboxPusher, OutboxWriteRequest, WriteOutcome};

use super::{Counselor, CounselorCache};

/// Counselor directory over the local cache and the remote `counselors`
/// collection. The directory is read-mostly: sync pulls the whole
/// collection, observations serve the UI, and the only routine mutation is
/// the availability flag.
pub struct CounselorRepository {
    cache: Arc<dyn CounselorCache>,
    remote: Arc<dyn DocumentStore>,
    pusher: Arc<OutboxPusher>,
}

impl CounselorRepository {
    pub fn new(
        cache: Arc<dyn CounselorCache>,
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
    pub async fn get_by_id(&self, counselor_id: &str) -> Result<Option<Counselor>> {
        if let Some(counselor) = self.cache.get_by_id(counselor_id)? {
            return Ok(Some(counselor));
        }
        self.fetch_from_remote(counselor_id).await
    }

    pub fn observe_all(&self) -> watch::Receiver<Vec<Counselor>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_all())
    }

    pub fn observe_available(&self) -> watch::Receiver<Vec<Counselor>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_available())
    }

    pub fn observe_by_rating(&self) -> watch::Receiver<Vec<Counselor>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_by_rating_desc())
    }

    pub fn observe_by_specialization(
        &self,
        specialization: &str,
    ) -> watch::Receiver<Vec<Counselor>> {
        let cache = self.cache.clone();
        let specialization = specialization.to_string();
        live_query(self.cache.changes(), move || {
            cache.list_by_specialization(&specialization)
        })
    }

    /// Specialization substring search over the cache.
    pub fn search(&self, query: &str) -> Result<Vec<Counselor>> {
        self.cache.list_by_specialization(query)
    }

    pub async fn update(&self, counselor: &Counselor) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::set(
            collections::COUNSELORS,
            &counselor.id,
            serde_json::to_value(counselor)?,
        );
        self.cache.update(counselor.clone(), intent.clone()).await?;
        self.pusher.push_request(&intent).await
    }

    pub async fn update_availability(
        &self,
        counselor_id: &str,
        is_available: bool,
    ) -> Result<WriteOutcome> {
        let mut fields = crate::remote::FieldMap::new();
        fields.insert("isAvailable".to_string(), Value::Bool(is_available));
        let intent = OutboxWriteRequest::patch(collections::COUNSELORS, counselor_id, fields);
        self.cache
            .set_availability(counselor_id, is_available, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    /// Pull the whole remote collection into the cache (remote wins),
    /// returning the fetched profiles.
    pub async fn sync_from_remote(&self) -> Result<Vec<Counselor>> {
        let docs = self.remote.query(collections::COUNSELORS, &[]).await?;
        let counselors = docs
            .into_iter()
            .map(serde_json::from_value::<Counselor>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.cache.upsert_many(counselors.clone()).await?;
        Ok(counselors)
    }

    /// Remote point-read, caching the document on success.
    pub async fn fetch_from_remote(&self, counselor_id: &str) -> Result<Option<Counselor>> {
        match self.remote.get(collections::COUNSELORS, counselor_id).await? {
            Some(doc) => {
                let counselor: Counselor = serde_json::from_value(doc)?;
                self.cache.upsert(counselor.clone()).await?;
                Ok(Some(counselor))
            }
            None => Ok(None),
        }
    }
}
