//! Tulia core: domain models, repositories, and sync engine for the student
//! mental-health support platform.
//!
//! Every entity kind lives in two stores at once: a local SQLite cache (fast,
//! offline-tolerant, backs all reads) and a remote document store (shared
//! source of truth). This crate owns the contracts for both sides and the
//! repositories that keep them in step.

pub mod appointments;
pub mod chat;
pub mod counselors;
pub mod errors;
pub mod observe;
pub mod remote;
pub mod resources;
pub mod screens;
pub mod session;
pub mod sync;
pub mod users;
pub mod utils;

pub use errors::{Error, Result};
pub use sync::WriteOutcome;
