use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::Result;
use crate::sync::OutboxWriteRequest;

use super::{Resource, ResourceCategory, ResourceKind};

/// Local cache of the `resources` table. Increment methods apply
/// `col = col + 1` in SQL rather than read-modify-write.
#[async_trait]
pub trait ResourceCache: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<Resource>>;

    fn list_all(&self) -> Result<Vec<Resource>>;

    fn list_by_category(&self, category: ResourceCategory) -> Result<Vec<Resource>>;

    fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>>;

    fn list_bookmarked(&self) -> Result<Vec<Resource>>;

    /// Substring search across title, description, and tags.
    fn search(&self, query: &str) -> Result<Vec<Resource>>;

    /// Most-liked resources, descending, capped at `limit`.
    fn list_popular(&self, limit: i64) -> Result<Vec<Resource>>;

    fn changes(&self) -> broadcast::Receiver<()>;

    async fn upsert(&self, resource: Resource) -> Result<()>;

    async fn upsert_many(&self, resources: Vec<Resource>) -> Result<()>;

    async fn update(&self, resource: Resource, intent: OutboxWriteRequest) -> Result<()>;

    /// Local-only bookmark flag; no remote intent.
    async fn set_bookmarked(&self, id: &str, is_bookmarked: bool) -> Result<()>;

    async fn increment_views(&self, id: &str, intent: OutboxWriteRequest) -> Result<()>;

    async fn increment_likes(&self, id: &str, intent: OutboxWriteRequest) -> Result<()>;
}
