use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::Result;
use crate::observe::live_query;
use crate::remote::{collections, DocumentStore, FieldFilter, FieldMap};
use crate::sync::{OutboxPusher, OutboxWriteRequest, WriteOutcome};
use crate::utils::now_millis;

use super::{ChatCache, ChatMessage, ChatSession, ChatStatus};

/// Chat sessions and messages over the local cache and the remote
/// `chat_sessions` / `chat_messages` collections.
///
/// Messages and sessions are created remote-first; everything after that
/// (status, read receipts, last-message preview) commits locally with an
/// outbox intent and is pushed immediately.
pub struct ChatRepository {
    cache: Arc<dyn ChatCache>,
    remote: Arc<dyn DocumentStore>,
    pusher: Arc<OutboxPusher>,
}

impl ChatRepository {
    pub fn new(
        cache: Arc<dyn ChatCache>,
        remote: Arc<dyn DocumentStore>,
        pusher: Arc<OutboxPusher>,
    ) -> Self {
        Self {
            cache,
            remote,
            pusher,
        }
    }

    // Sessions

    pub fn session_by_id(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.cache.session_by_id(session_id)
    }

    pub fn observe_sessions_by_user(&self, user_id: &str) -> watch::Receiver<Vec<ChatSession>> {
        let cache = self.cache.clone();
        let user_id = user_id.to_string();
        live_query(self.cache.changes(), move || {
            cache.sessions_by_user(&user_id)
        })
    }

    pub fn observe_sessions_by_counselor(
        &self,
        counselor_id: &str,
    ) -> watch::Receiver<Vec<ChatSession>> {
        let cache = self.cache.clone();
        let counselor_id = counselor_id.to_string();
        live_query(self.cache.changes(), move || {
            cache.sessions_by_counselor(&counselor_id)
        })
    }

    pub fn sessions_by_status(&self, status: ChatStatus) -> Result<Vec<ChatSession>> {
        self.cache.sessions_by_status(status)
    }

    /// Remote-first session create: no local row unless the remote
    /// accepted it.
    pub async fn create_session(&self, session: &ChatSession) -> Result<()> {
        let doc = serde_json::to_value(session)?;
        self.remote
            .set(collections::CHAT_SESSIONS, &session.id, doc)
            .await?;
        self.cache.upsert_session(session.clone()).await
    }

    pub async fn update_session(&self, session: &ChatSession) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::set(
            collections::CHAT_SESSIONS,
            &session.id,
            serde_json::to_value(session)?,
        );
        self.cache
            .update_session(session.clone(), intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    pub async fn end_session(&self, session_id: &str) -> Result<WriteOutcome> {
        let ended_at = now_millis();
        let mut fields = FieldMap::new();
        fields.insert(
            "status".to_string(),
            serde_json::to_value(ChatStatus::Ended)?,
        );
        fields.insert("endedAt".to_string(), Value::from(ended_at));
        let intent = OutboxWriteRequest::patch(collections::CHAT_SESSIONS, session_id, fields);
        self.cache
            .set_session_status(session_id, ChatStatus::Ended, ended_at, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    // Messages

    pub fn message_by_id(&self, message_id: &str) -> Result<Option<ChatMessage>> {
        self.cache.message_by_id(message_id)
    }

    /// Messages in a chat, timestamp ascending.
    pub fn observe_messages(&self, chat_id: &str) -> watch::Receiver<Vec<ChatMessage>> {
        let cache = self.cache.clone();
        let chat_id = chat_id.to_string();
        live_query(self.cache.changes(), move || {
            cache.messages_by_chat(&chat_id)
        })
    }

    /// Send one message. The message itself is remote-first (an `Err` means
    /// nothing was stored anywhere); the session's last-message preview then
    /// follows the local-plus-outbox path, and its outcome is returned.
    pub async fn send_message(&self, message: &ChatMessage) -> Result<WriteOutcome> {
        let doc = serde_json::to_value(message)?;
        self.remote
            .set(collections::CHAT_MESSAGES, &message.id, doc)
            .await?;
        self.cache.upsert_message(message.clone()).await?;

        let mut fields = FieldMap::new();
        fields.insert(
            "lastMessage".to_string(),
            Value::String(message.body.clone()),
        );
        fields.insert(
            "lastMessageTime".to_string(),
            Value::from(message.timestamp),
        );
        let intent =
            OutboxWriteRequest::patch(collections::CHAT_SESSIONS, &message.chat_id, fields);
        self.cache
            .set_session_last_message(
                &message.chat_id,
                &message.body,
                message.timestamp,
                intent.clone(),
            )
            .await?;
        self.pusher.push_request(&intent).await
    }

    /// Mark every message in the chat from other senders as read. The local
    /// flips and one patch intent per affected message commit together; the
    /// intents then go to the remote as a single batched update.
    pub async fn mark_messages_as_read(
        &self,
        chat_id: &str,
        reader_id: &str,
    ) -> Result<WriteOutcome> {
        let intents = self.cache.mark_read(chat_id, reader_id).await?;
        self.pusher.push_patch_batch(&intents).await
    }

    pub fn unread_messages_count(&self, chat_id: &str, reader_id: &str) -> Result<usize> {
        Ok(self.cache.unread_messages(chat_id, reader_id)?.len())
    }

    /// Pull one chat's messages from the remote into the cache (remote
    /// wins), returning them timestamp ascending.
    pub async fn sync_messages_from_remote(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let docs = self
            .remote
            .query(
                collections::CHAT_MESSAGES,
                &[FieldFilter::eq("chatId", chat_id)],
            )
            .await?;
        let mut messages = docs
            .into_iter()
            .map(serde_json::from_value::<ChatMessage>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        messages.sort_by_key(|m| m.timestamp);
        self.cache.upsert_messages(messages.clone()).await?;
        Ok(messages)
    }
}
