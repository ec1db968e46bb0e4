use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::Result;
use crate::sync::OutboxWriteRequest;

use super::User;

/// Local cache of the `users` table. Reads run on the caller's thread
/// against the pool; writes go through the serialized write actor. Methods
/// taking an [`OutboxWriteRequest`] commit the intent in the same
/// transaction as the row mutation.
#[async_trait]
pub trait UserCache: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>>;

    fn list_all(&self) -> Result<Vec<User>>;

    /// Fires after every committed write to the table.
    fn changes(&self) -> broadcast::Receiver<()>;

    async fn upsert(&self, user: User) -> Result<()>;

    async fn upsert_many(&self, users: Vec<User>) -> Result<()>;

    async fn update(&self, user: User, intent: OutboxWriteRequest) -> Result<()>;

    async fn set_last_active(
        &self,
        id: &str,
        timestamp: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()>;

    /// Local-only hard delete, used on sign-out.
    async fn delete_by_id(&self, id: &str) -> Result<()>;
}
