//! Mental-health resource library.

mod cache;
mod model;
mod repository;

pub use cache::ResourceCache;
pub use model::{Resource, ResourceCategory, ResourceKind};
pub use repository::ResourceRepository;
