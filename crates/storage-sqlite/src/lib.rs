//! SQLite-backed cache stores for the Tulia data platform.
//!
//! Reads go straight to the r2d2 pool; every write funnels through a single
//! writer thread so cache rows and their outbox intents commit in one
//! immediate transaction.

pub mod appointments;
pub mod chat;
pub mod counselors;
pub mod db;
pub mod errors;
pub mod outbox;
pub mod resources;
pub mod schema;
pub mod users;

pub use appointments::AppointmentStore;
pub use chat::ChatStore;
pub use counselors::CounselorStore;
pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, WriteHandle};
pub use errors::StorageError;
pub use outbox::OutboxStore;
pub use resources::ResourceStore;
pub use users::UserStore;
