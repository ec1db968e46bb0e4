use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::Result;
use crate::observe::live_query;
use crate::remote::{collections, DocumentStore, FieldFilter, FieldMap};
use crate::sync::{OutboxPusher, OutboxWriteRequest, WriteOutcome};
use crate::utils::now_millis;

use super::{Appointment, AppointmentCache, AppointmentStatus};

/// Appointments over the local cache and the remote `appointments`
/// collection. Booking is remote-first; status transitions commit locally
/// with an outbox intent and bump `updatedAt` in the same patch.
pub struct AppointmentRepository {
    cache: Arc<dyn AppointmentCache>,
    remote: Arc<dyn DocumentStore>,
    pusher: Arc<OutboxPusher>,
}

impl AppointmentRepository {
    pub fn new(
        cache: Arc<dyn AppointmentCache>,
        remote: Arc<dyn DocumentStore>,
        pusher: Arc<OutboxPusher>,
    ) -> Self {
        Self {
            cache,
            remote,
            pusher,
        }
    }

    pub fn get_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        self.cache.get_by_id(appointment_id)
    }

    pub fn observe_by_user(&self, user_id: &str) -> watch::Receiver<Vec<Appointment>> {
        let cache = self.cache.clone();
        let user_id = user_id.to_string();
        live_query(self.cache.changes(), move || cache.list_by_user(&user_id))
    }

    pub fn observe_by_counselor(&self, counselor_id: &str) -> watch::Receiver<Vec<Appointment>> {
        let cache = self.cache.clone();
        let counselor_id = counselor_id.to_string();
        live_query(self.cache.changes(), move || {
            cache.list_by_counselor(&counselor_id)
        })
    }

    pub fn observe_by_user_and_status(
        &self,
        user_id: &str,
        status: AppointmentStatus,
    ) -> watch::Receiver<Vec<Appointment>> {
        let cache = self.cache.clone();
        let user_id = user_id.to_string();
        live_query(self.cache.changes(), move || {
            cache.list_by_user_and_status(&user_id, status)
        })
    }

    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        self.cache.list_by_user(user_id)
    }

    pub fn list_in_range(&self, start: i64, end: i64) -> Result<Vec<Appointment>> {
        self.cache.list_in_range(start, end)
    }

    /// Remote-first booking: no local row unless the remote accepted it.
    pub async fn create(&self, appointment: &Appointment) -> Result<()> {
        let doc = serde_json::to_value(appointment)?;
        self.remote
            .set(collections::APPOINTMENTS, &appointment.id, doc)
            .await?;
        self.cache.upsert(appointment.clone()).await
    }

    pub async fn update(&self, appointment: &Appointment) -> Result<WriteOutcome> {
        let intent = OutboxWriteRequest::set(
            collections::APPOINTMENTS,
            &appointment.id,
            serde_json::to_value(appointment)?,
        );
        self.cache
            .update(appointment.clone(), intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    /// Status transition; `updatedAt` moves with the status in the same
    /// local transaction and remote patch.
    pub async fn update_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<WriteOutcome> {
        let updated_at = now_millis();
        let mut fields = FieldMap::new();
        fields.insert("status".to_string(), serde_json::to_value(status)?);
        fields.insert("updatedAt".to_string(), Value::from(updated_at));
        let intent = OutboxWriteRequest::patch(collections::APPOINTMENTS, appointment_id, fields);
        self.cache
            .set_status(appointment_id, status, updated_at, intent.clone())
            .await?;
        self.pusher.push_request(&intent).await
    }

    pub async fn cancel(&self, appointment_id: &str) -> Result<WriteOutcome> {
        self.update_status(appointment_id, AppointmentStatus::Cancelled)
            .await
    }

    pub async fn confirm(&self, appointment_id: &str) -> Result<WriteOutcome> {
        self.update_status(appointment_id, AppointmentStatus::Confirmed)
            .await
    }

    /// Pull one user's appointments from the remote into the cache (remote
    /// wins), returning the fetched list.
    pub async fn sync_from_remote(&self, user_id: &str) -> Result<Vec<Appointment>> {
        let docs = self
            .remote
            .query(
                collections::APPOINTMENTS,
                &[FieldFilter::eq("userId", user_id)],
            )
            .await?;
        let appointments = docs
            .into_iter()
            .map(serde_json::from_value::<Appointment>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.cache.upsert_many(appointments.clone()).await?;
        Ok(appointments)
    }
}
