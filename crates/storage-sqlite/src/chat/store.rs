use async_trait::async_trait;
use diesel::prelude::*;
use serde_json::Value;
use tokio::sync::broadcast;

use tulia_core::chat::{ChatCache, ChatMessage, ChatSession, ChatStatus};
use tulia_core::errors::Result;
use tulia_core::remote::{collections, FieldMap};
use tulia_core::sync::OutboxWriteRequest;

use crate::db::{enum_to_db, get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::write_outbox_request;
use crate::schema::{chat_messages, chat_sessions};

use super::{ChatMessageDB, ChatSessionDB};

/// Store over both chat tables. Sessions and their messages share one
/// change signal since screens render them together.
pub struct ChatStore {
    pool: DbPool,
    writer: WriteHandle,
    changed: broadcast::Sender<()>,
}

impl ChatStore {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        let (changed, _) = broadcast::channel(64);
        Self {
            pool,
            writer,
            changed,
        }
    }

    fn notify(&self) {
        let _ = self.changed.send(());
    }

    fn sessions_to_domain(rows: Vec<ChatSessionDB>) -> Result<Vec<ChatSession>> {
        rows.into_iter().map(ChatSessionDB::into_domain).collect()
    }

    fn messages_to_domain(rows: Vec<ChatMessageDB>) -> Result<Vec<ChatMessage>> {
        rows.into_iter().map(ChatMessageDB::into_domain).collect()
    }
}

#[async_trait]
impl ChatCache for ChatStore {
    fn session_by_id(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        let row = chat_sessions::table
            .find(session_id)
            .first::<ChatSessionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(ChatSessionDB::into_domain).transpose()
    }

    fn sessions_by_user(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = chat_sessions::table
            .filter(chat_sessions::user_id.eq(user_id))
            .order(chat_sessions::last_message_time.desc())
            .load::<ChatSessionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::sessions_to_domain(rows)
    }

    fn sessions_by_counselor(&self, counselor_id: &str) -> Result<Vec<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = chat_sessions::table
            .filter(chat_sessions::counselor_id.eq(counselor_id))
            .order(chat_sessions::last_message_time.desc())
            .load::<ChatSessionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::sessions_to_domain(rows)
    }

    fn sessions_by_status(&self, status: ChatStatus) -> Result<Vec<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = chat_sessions::table
            .filter(chat_sessions::status.eq(enum_to_db(&status)?))
            .order(chat_sessions::last_message_time.desc())
            .load::<ChatSessionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::sessions_to_domain(rows)
    }

    fn message_by_id(&self, message_id: &str) -> Result<Option<ChatMessage>> {
        let mut conn = get_connection(&self.pool)?;
        let row = chat_messages::table
            .find(message_id)
            .first::<ChatMessageDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(ChatMessageDB::into_domain).transpose()
    }

    fn messages_by_chat(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = chat_messages::table
            .filter(chat_messages::chat_id.eq(chat_id))
            .order(chat_messages::timestamp.asc())
            .load::<ChatMessageDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::messages_to_domain(rows)
    }

    fn unread_messages(&self, chat_id: &str, reader_id: &str) -> Result<Vec<ChatMessage>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = chat_messages::table
            .filter(chat_messages::chat_id.eq(chat_id))
            .filter(chat_messages::is_read.eq(false))
            .filter(chat_messages::sender_id.ne(reader_id))
            .order(chat_messages::timestamp.asc())
            .load::<ChatMessageDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::messages_to_domain(rows)
    }

    fn changes(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    async fn upsert_session(&self, session: ChatSession) -> Result<()> {
        let row = ChatSessionDB::from_domain(session)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(chat_sessions::table)
                    .values(&row)
                    .on_conflict(chat_sessions::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn update_session(
        &self,
        session: ChatSession,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let row = ChatSessionDB::from_domain(session)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(chat_sessions::table)
                    .values(&row)
                    .on_conflict(chat_sessions::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn set_session_status(
        &self,
        session_id: &str,
        status: ChatStatus,
        ended_at: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        let status_text = enum_to_db(&status)?;
        self.writer
            .exec(move |conn| {
                diesel::update(chat_sessions::table.find(&session_id))
                    .set((
                        chat_sessions::status.eq(&status_text),
                        chat_sessions::ended_at.eq(ended_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn set_session_last_message(
        &self,
        session_id: &str,
        last_message: &str,
        last_message_time: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        let last_message = last_message.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(chat_sessions::table.find(&session_id))
                    .set((
                        chat_sessions::last_message.eq(&last_message),
                        chat_sessions::last_message_time.eq(last_message_time),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn upsert_message(&self, message: ChatMessage) -> Result<()> {
        let row = ChatMessageDB::from_domain(message)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(chat_messages::table)
                    .values(&row)
                    .on_conflict(chat_messages::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn upsert_messages(&self, message_list: Vec<ChatMessage>) -> Result<()> {
        if message_list.is_empty() {
            return Ok(());
        }
        let rows = message_list
            .into_iter()
            .map(ChatMessageDB::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.writer
            .exec(move |conn| {
                for row in &rows {
                    diesel::insert_into(chat_messages::table)
                        .values(row)
                        .on_conflict(chat_messages::id)
                        .do_update()
                        .set(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn mark_read(
        &self,
        chat_id: &str,
        reader_id: &str,
    ) -> Result<Vec<OutboxWriteRequest>> {
        let chat_id = chat_id.to_string();
        let reader_id = reader_id.to_string();
        let intents = self
            .writer
            .exec(move |conn| {
                let unread_ids = chat_messages::table
                    .filter(chat_messages::chat_id.eq(&chat_id))
                    .filter(chat_messages::is_read.eq(false))
                    .filter(chat_messages::sender_id.ne(&reader_id))
                    .select(chat_messages::id)
                    .load::<String>(conn)
                    .map_err(StorageError::from)?;
                if unread_ids.is_empty() {
                    return Ok(Vec::new());
                }
                diesel::update(
                    chat_messages::table.filter(chat_messages::id.eq_any(&unread_ids)),
                )
                .set(chat_messages::is_read.eq(true))
                .execute(conn)
                .map_err(StorageError::from)?;
                let mut intents = Vec::with_capacity(unread_ids.len());
                for message_id in unread_ids {
                    let mut fields = FieldMap::new();
                    fields.insert("isRead".to_string(), Value::Bool(true));
                    let intent =
                        OutboxWriteRequest::patch(collections::CHAT_MESSAGES, message_id, fields);
                    write_outbox_request(conn, &intent)?;
                    intents.push(intent);
                }
                Ok(intents)
            })
            .await?;
        if !intents.is_empty() {
            self.notify();
        }
        Ok(intents)
    }
}
