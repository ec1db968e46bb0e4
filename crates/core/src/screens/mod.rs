//! Presentation state holders.
//!
//! One holder per screen. Each owns a `watch::Sender` whose snapshot is
//! replaced wholesale on every repository callback; a UI layer renders from
//! the matching receiver. Loads are sync-then-observe: pull from the remote
//! once, then follow the cache. Background tasks are aborted when the
//! holder is dropped.

mod appointments;
mod chat;
mod counselors;
mod home;
mod resources;

pub use appointments::{AppointmentsScreen, AppointmentsState};
pub use chat::{ChatScreen, ChatState};
pub use counselors::{CounselorDirectory, CounselorDirectoryState};
pub use home::{HomeScreen, HomeState};
pub use resources::{ResourceLibrary, ResourceLibraryState};
