use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::Result;
use crate::observe::live_query;
use crate::remote::{collections, DocumentStore};
use crate::sync::{OutboxPusher, OutboxWriteRequest, WriteOutcome};

use super::{Resource, ResourceCache, ResourceCategory, ResourceKind};

/// Resource library over the local cache and the remote `resources`
/// collection. Bookmarks stay local; like/view counters move through
/// server-side increments so concurrent readers never lose counts.
pub struct ResourceRepository {
    cache: Arc<dyn ResourceCache>,
    remote: Arc<dyn DocumentStore>,
    pusher: Arc<OutboxPusher>,
}

impl ResourceRepository {
    pub fn new(
        cache: Arc<dyn ResourceCache>,
        remote: Arc<dyn DocumentStore>,
        pusher: Arc<OutboxPusher>,
    ) -> Self {
        Self {
            cache,
            remote,
            pusher,
        }
    }

    pub fn get_by_id(&self, resource_id: &str) -> Result<Option<Resource>> {
        self.cache.get_by_id(resource_id)
    }

    pub fn observe_all(&self) -> watch::Receiver<Vec<Resource>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_all())
    }

    pub fn observe_by_category(&self, category: ResourceCategory) -> watch::Receiver<Vec<Resource>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || {
            cache.list_by_category(category)
        })
    }

    pub fn observe_by_kind(&self, kind: ResourceKind) -> watch::Receiver<Vec<Resource>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_by_kind(kind))
    }

    pub fn observe_bookmarked(&self) -> watch::Receiver<Vec<Resource>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_bookmarked())
    }

    pub fn observe_popular(&self, limit: i64) -> watch::Receiver<Vec<Resource>> {
        let cache = self.cache.clone();
        live_query(self.cache.changes(), move || cache.list_popular(limit))
    }

    pub fn search(&self, query: &str) -> Result<Vec<Resource>> {
        self.cache.search(query)
    }

    pub fn list_popular(&self, limit: i64) -> Result<Vec<Resource>> {
        self.cache.list_popular(limit)
    }

    pub async fn update(&self, resource: &Resource) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::set(
            collections::RESOURCES,
            &resource.id,
            serde_json::to_value(resource)?,
        );
        self.cache.update(resource.clone(), intent.clone()).await?;
        self.pusher.push_request(&intent).await
    }

    /// Bookmarks are a per-device flag and never leave the cache.
    pub async fn toggle_bookmark(&self, resource_id: &str, is_bookmarked: bool) -> Result<()> {
        self.cache.set_bookmarked(resource_id, is_bookmarked).await
    }

    pub async fn increment_views(&self, resource_id: &str) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::increment(collections::RESOURCES, resource_id, "views");
        self.cache
            .increment_views(resource_id, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    pub async fn increment_likes(&self, resource_id: &str) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::increment(collections::RESOURCES, resource_id, "likes");
        self.cache
            .increment_likes(resource_id, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    /// Pull the whole remote collection into the cache (remote wins),
    /// returning the fetched list.
    pub async fn sync_from_remote(&self) -> Result<Vec<Resource>> {
        let docs = self.remote.query(collections::RESOURCES, &[]).await?;
        let resources = docs
            .into_iter()
            .map(serde_json::from_value::<Resource>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.cache.upsert_many(resources.clone()).await?;
        Ok(resources)
    }
}
