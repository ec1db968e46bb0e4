use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::Result;
use crate::sync::OutboxWriteRequest;

use super::{ChatMessage, ChatSession, ChatStatus};

/// Local cache of the `chat_sessions` and `chat_messages` tables. One
/// change signal covers both tables; message lists are ordered by
/// timestamp ascending.
#[async_trait]
pub trait ChatCache: Send + Sync {
    fn session_by_id(&self, id: &str) -> Result<Option<ChatSession>>;

    fn sessions_by_user(&self, user_id: &str) -> Result<Vec<ChatSession>>;

    fn sessions_by_counselor(&self, counselor_id: &str) -> Result<Vec<ChatSession>>;

    fn sessions_by_status(&self, status: ChatStatus) -> Result<Vec<ChatSession>>;

    fn message_by_id(&self, id: &str) -> Result<Option<ChatMessage>>;

    fn messages_by_chat(&self, chat_id: &str) -> Result<Vec<ChatMessage>>;

    /// Unread messages in a chat sent by anyone other than `reader_id`.
    fn unread_messages(&self, chat_id: &str, reader_id: &str) -> Result<Vec<ChatMessage>>;

    fn changes(&self) -> broadcast::Receiver<()>;

    async fn upsert_session(&self, session: ChatSession) -> Result<()>;

    async fn update_session(&self, session: ChatSession, intent: OutboxWriteRequest)
        -> Result<()>;

    async fn set_session_status(
        &self,
        id: &str,
        status: ChatStatus,
        ended_at: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()>;

    async fn set_session_last_message(
        &self,
        id: &str,
        last_message: &str,
        last_message_time: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()>;

    async fn upsert_message(&self, message: ChatMessage) -> Result<()>;

    async fn upsert_messages(&self, messages: Vec<ChatMessage>) -> Result<()>;

    /// Flip `isRead` on every unread message in the chat not sent by
    /// `reader_id`, enqueueing one patch intent per flipped message in the
    /// same transaction. Returns the enqueued intents for the immediate
    /// push attempt.
    async fn mark_read(&self, chat_id: &str, reader_id: &str)
        -> Result<Vec<OutboxWriteRequest>>;
}
