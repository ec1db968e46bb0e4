//! Student accounts.

mod cache;
mod model;
mod repository;

pub use cache::UserCache;
pub use model::User;
pub use repository::UserRepository;
