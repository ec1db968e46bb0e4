use serde::{Deserialize, Serialize};

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderKind {
    #[default]
    Student,
    Counselor,
    Admin,
}

/// Message payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
    File,
    System,
}

/// Chat session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatStatus {
    #[default]
    Active,
    Ended,
    Archived,
}

/// One conversation between a student and a counselor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub counselor_id: String,
    pub title: String,
    pub status: ChatStatus,
    pub last_message: String,
    pub last_message_time: i64,
    pub created_at: i64,
    pub ended_at: i64,
}

/// One message in a session. Ordering is by `timestamp` (caller-assigned
/// epoch millis), not arrival order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(rename = "senderType")]
    pub sender_kind: SenderKind,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "messageType")]
    pub kind: MessageKind,
    pub attachment_url: String,
    pub timestamp: i64,
    pub is_read: bool,
    pub is_edited: bool,
    pub edited_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_document_field_names_match_the_stored_shape() {
        let message = ChatMessage {
            id: "m1".into(),
            chat_id: "c1".into(),
            sender_kind: SenderKind::Counselor,
            body: "hello".into(),
            kind: MessageKind::Text,
            ..ChatMessage::default()
        };
        let doc = serde_json::to_value(&message).unwrap();
        assert_eq!(doc["senderType"], "COUNSELOR");
        assert_eq!(doc["message"], "hello");
        assert_eq!(doc["messageType"], "TEXT");
        assert_eq!(doc["isRead"], false);
    }

    #[test]
    fn session_round_trips_through_document_shape() {
        let session = ChatSession {
            id: "c1".into(),
            user_id: "u1".into(),
            status: ChatStatus::Ended,
            ended_at: 1_700_000_000_000,
            ..ChatSession::default()
        };
        let doc = serde_json::to_value(&session).unwrap();
        assert_eq!(doc["status"], "ENDED");
        assert_eq!(doc["endedAt"], 1_700_000_000_000i64);
        let back: ChatSession = serde_json::from_value(doc).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn sparse_message_document_uses_defaults() {
        let message: ChatMessage =
            serde_json::from_value(json!({ "id": "m1", "chatId": "c1" })).unwrap();
        assert_eq!(message.sender_kind, SenderKind::Student);
        assert_eq!(message.kind, MessageKind::Text);
        assert!(!message.is_read);
    }
}
