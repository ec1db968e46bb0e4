//! Chat sessions and messages between students and counselors.

mod cache;
mod model;
mod repository;

pub use cache::ChatCache;
pub use model::{ChatMessage, ChatSession, ChatStatus, MessageKind, SenderKind};
pub use repository::ChatRepository;
