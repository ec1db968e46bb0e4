use diesel::prelude::*;

use tulia_core::chat::{ChatMessage, ChatSession};
use tulia_core::errors::Result;

use crate::db::{enum_from_db, enum_to_db};
use crate::schema::{chat_messages, chat_sessions};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = chat_sessions)]
pub struct ChatSessionDB {
    pub id: String,
    pub user_id: String,
    pub counselor_id: String,
    pub title: String,
    pub status: String,
    pub last_message: String,
    pub last_message_time: i64,
    pub created_at: i64,
    pub ended_at: i64,
}

impl ChatSessionDB {
    pub fn from_domain(session: ChatSession) -> Result<Self> {
        Ok(Self {
            id: session.id,
            user_id: session.user_id,
            counselor_id: session.counselor_id,
            title: session.title,
            status: enum_to_db(&session.status)?,
            last_message: session.last_message,
            last_message_time: session.last_message_time,
            created_at: session.created_at,
            ended_at: session.ended_at,
        })
    }

    pub fn into_domain(self) -> Result<ChatSession> {
        Ok(ChatSession {
            id: self.id,
            user_id: self.user_id,
            counselor_id: self.counselor_id,
            title: self.title,
            status: enum_from_db(&self.status)?,
            last_message: self.last_message,
            last_message_time: self.last_message_time,
            created_at: self.created_at,
            ended_at: self.ended_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = chat_messages)]
pub struct ChatMessageDB {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_kind: String,
    pub body: String,
    pub kind: String,
    pub attachment_url: String,
    pub timestamp: i64,
    pub is_read: bool,
    pub is_edited: bool,
    pub edited_at: i64,
}

impl ChatMessageDB {
    pub fn from_domain(message: ChatMessage) -> Result<Self> {
        Ok(Self {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            sender_kind: enum_to_db(&message.sender_kind)?,
            body: message.body,
            kind: enum_to_db(&message.kind)?,
            attachment_url: message.attachment_url,
            timestamp: message.timestamp,
            is_read: message.is_read,
            is_edited: message.is_edited,
            edited_at: message.edited_at,
        })
    }

    pub fn into_domain(self) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: self.id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            sender_kind: enum_from_db(&self.sender_kind)?,
            body: self.body,
            kind: enum_from_db(&self.kind)?,
            attachment_url: self.attachment_url,
            timestamp: self.timestamp,
            is_read: self.is_read,
            is_edited: self.is_edited,
            edited_at: self.edited_at,
        })
    }
}
