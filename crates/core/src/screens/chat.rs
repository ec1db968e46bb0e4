use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::chat::{ChatMessage, ChatRepository, MessageKind, SenderKind};
use crate::errors::Result;
use crate::session::SessionProvider;
use crate::sync::WriteOutcome;
use crate::utils::now_millis;

/// Snapshot rendered by one open conversation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatState {
    pub is_loading: bool,
    pub messages: Vec<ChatMessage>,
    pub error: Option<String>,
}

/// One open conversation: sync its messages once, then follow the cache
/// (timestamp ascending).
pub struct ChatScreen {
    repository: Arc<ChatRepository>,
    session: Arc<dyn SessionProvider>,
    chat_id: String,
    sender_name: String,
    sender_kind: SenderKind,
    state: watch::Sender<ChatState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatScreen {
    pub fn new(
        repository: Arc<ChatRepository>,
        session: Arc<dyn SessionProvider>,
        chat_id: impl Into<String>,
        sender_name: impl Into<String>,
        sender_kind: SenderKind,
    ) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            repository,
            session,
            chat_id: chat_id.into(),
            sender_name: sender_name.into(),
            sender_kind,
            state,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub async fn load(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        if let Err(err) = self
            .repository
            .sync_messages_from_remote(&self.chat_id)
            .await
        {
            self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(err.to_string());
            });
        }

        let mut rx = self.repository.observe_messages(&self.chat_id);
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let messages = rx.borrow_and_update().clone();
                state.send_modify(|s| {
                    s.is_loading = false;
                    s.messages = messages;
                });
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        if let Some(previous) = self.task.lock().expect("screen task lock").replace(handle) {
            previous.abort();
        }
    }

    /// Send a text message as the signed-in user. The timestamp is assigned
    /// here; message order in the chat is timestamp order, not send order.
    pub async fn send(&self, body: &str) -> Result<WriteOutcome> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            chat_id: self.chat_id.clone(),
            sender_id: self.session.current_user_id()?,
            sender_name: self.sender_name.clone(),
            sender_kind: self.sender_kind,
            body: body.to_string(),
            kind: MessageKind::Text,
            timestamp: now_millis(),
            ..ChatMessage::default()
        };
        let outcome = self.repository.send_message(&message).await;
        if let Err(err) = &outcome {
            let text = err.to_string();
            self.state.send_modify(|s| s.error = Some(text.clone()));
        }
        outcome
    }

    /// Mark the other side's messages as read.
    pub async fn mark_read(&self) -> Result<WriteOutcome> {
        let reader_id = self.session.current_user_id()?;
        self.repository
            .mark_messages_as_read(&self.chat_id, &reader_id)
            .await
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}

impl Drop for ChatScreen {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("screen task lock").take() {
            task.abort();
        }
    }
}
