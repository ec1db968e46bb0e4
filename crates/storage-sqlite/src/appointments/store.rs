use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::broadcast;

use tulia_core::appointments::{Appointment, AppointmentCache, AppointmentStatus};
use tulia_core::errors::Result;
use tulia_core::sync::OutboxWriteRequest;

use crate::db::{enum_to_db, get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::write_outbox_request;
use crate::schema::appointments;

use super::AppointmentDB;

pub struct AppointmentStore {
    pool: DbPool,
    writer: WriteHandle,
    changed: broadcast::Sender<()>,
}

impl AppointmentStore {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        let (changed, _) = broadcast::channel(64);
        Self {
            pool,
            writer,
            changed,
        }
    }

    fn notify(&self) {
        let _ = self.changed.send(());
    }

    fn rows_to_domain(rows: Vec<AppointmentDB>) -> Result<Vec<Appointment>> {
        rows.into_iter().map(AppointmentDB::into_domain).collect()
    }
}

#[async_trait]
impl AppointmentCache for AppointmentStore {
    fn get_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let row = appointments::table
            .find(appointment_id)
            .first::<AppointmentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(AppointmentDB::into_domain).transpose()
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::user_id.eq(user_id))
            .order(appointments::scheduled_date_time.asc())
            .load::<AppointmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_counselor(&self, counselor_id: &str) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::counselor_id.eq(counselor_id))
            .order(appointments::scheduled_date_time.asc())
            .load::<AppointmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_user_and_status(
        &self,
        user_id: &str,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::user_id.eq(user_id))
            .filter(appointments::status.eq(enum_to_db(&status)?))
            .order(appointments::scheduled_date_time.asc())
            .load::<AppointmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::status.eq(enum_to_db(&status)?))
            .order(appointments::scheduled_date_time.asc())
            .load::<AppointmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_in_range(&self, start: i64, end: i64) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::scheduled_date_time.ge(start))
            .filter(appointments::scheduled_date_time.le(end))
            .order(appointments::scheduled_date_time.asc())
            .load::<AppointmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn changes(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    async fn upsert(&self, appointment: Appointment) -> Result<()> {
        let row = AppointmentDB::from_domain(appointment)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(appointments::table)
                    .values(&row)
                    .on_conflict(appointments::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn upsert_many(&self, appointment_list: Vec<Appointment>) -> Result<()> {
        if appointment_list.is_empty() {
            return Ok(());
        }
        let rows = appointment_list
            .into_iter()
            .map(AppointmentDB::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.writer
            .exec(move |conn| {
                for row in &rows {
                    diesel::insert_into(appointments::table)
                        .values(row)
                        .on_conflict(appointments::id)
                        .do_update()
                        .set(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn update(&self, appointment: Appointment, intent: OutboxWriteRequest) -> Result<()> {
        let row = AppointmentDB::from_domain(appointment)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(appointments::table)
                    .values(&row)
                    .on_conflict(appointments::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn set_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        updated_at: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let appointment_id = appointment_id.to_string();
        let status_text = enum_to_db(&status)?;
        self.writer
            .exec(move |conn| {
                diesel::update(appointments::table.find(&appointment_id))
                    .set((
                        appointments::status.eq(&status_text),
                        appointments::updated_at.eq(updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }
}
