mod model;
mod store;

pub use model::AppointmentDB;
pub use store::AppointmentStore;
