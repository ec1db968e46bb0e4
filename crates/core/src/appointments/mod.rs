//! Counseling appointments.

mod cache;
mod model;
mod repository;

pub use cache::AppointmentCache;
pub use model::{Appointment, AppointmentKind, AppointmentStatus};
pub use repository::AppointmentRepository;
