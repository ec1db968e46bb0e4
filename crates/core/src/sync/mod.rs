//! Local-cache / remote-store synchronization: outbox model and push engine.

mod outbox;
mod pusher;

pub use outbox::*;
pub use pusher::*;
