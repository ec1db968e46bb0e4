use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::Result;
use crate::sync::OutboxWriteRequest;

use super::Counselor;

/// Local cache of the `counselors` table.
#[async_trait]
pub trait CounselorCache: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<Counselor>>;

    fn list_all(&self) -> Result<Vec<Counselor>>;

    fn list_available(&self) -> Result<Vec<Counselor>>;

    fn list_by_rating_desc(&self) -> Result<Vec<Counselor>>;

    /// Substring match over the JSON-encoded specializations list.
    fn list_by_specialization(&self, specialization: &str) -> Result<Vec<Counselor>>;

    fn changes(&self) -> broadcast::Receiver<()>;

    async fn upsert(&self, counselor: Counselor) -> Result<()>;

    async fn upsert_many(&self, counselors: Vec<Counselor>) -> Result<()>;

    async fn update(&self, counselor: Counselor, intent: OutboxWriteRequest) -> Result<()>;

    async fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        intent: OutboxWriteRequest,
    ) -> Result<()>;
}
