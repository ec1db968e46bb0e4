use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::Result;
use crate::sync::OutboxWriteRequest;

use super::{Appointment, AppointmentStatus};

/// Local cache of the `appointments` table. List reads are ordered by
/// scheduled time ascending.
#[async_trait]
pub trait AppointmentCache: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<Appointment>>;

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>>;

    fn list_by_counselor(&self, counselor_id: &str) -> Result<Vec<Appointment>>;

    fn list_by_user_and_status(
        &self,
        user_id: &str,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>>;

    fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>>;

    /// Appointments scheduled within `[start, end]` epoch millis.
    fn list_in_range(&self, start: i64, end: i64) -> Result<Vec<Appointment>>;

    fn changes(&self) -> broadcast::Receiver<()>;

    async fn upsert(&self, appointment: Appointment) -> Result<()>;

    async fn upsert_many(&self, appointments: Vec<Appointment>) -> Result<()>;

    async fn update(&self, appointment: Appointment, intent: OutboxWriteRequest) -> Result<()>;

    async fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_at: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()>;
}
