//! Counselor directory.

mod cache;
mod model;
mod repository;

pub use cache::CounselorCache;
pub use model::Counselor;
pub use repository::CounselorRepository;
