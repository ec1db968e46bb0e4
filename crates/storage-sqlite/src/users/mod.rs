mod model;
mod store;

pub use model::UserDB;
pub use store::UserStore;
