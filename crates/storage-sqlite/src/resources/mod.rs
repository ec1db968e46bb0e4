mod model;
mod store;

pub use model::ResourceDB;
pub use store::ResourceStore;
