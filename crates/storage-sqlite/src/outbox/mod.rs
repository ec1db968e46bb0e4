//! Durable outbox table backing the push engine.

mod model;
mod store;

pub use model::OutboxEventDB;
pub use store::{write_outbox_request, OutboxStore};
