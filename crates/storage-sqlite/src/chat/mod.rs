mod model;
mod store;

pub use model::{ChatMessageDB, ChatSessionDB};
pub use store::ChatStore;
