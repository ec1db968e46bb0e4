mod model;
mod store;

pub use model::CounselorDB;
pub use store::CounselorStore;
