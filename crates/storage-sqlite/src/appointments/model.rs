use diesel::prelude::*;

use tulia_core::appointments::Appointment;
use tulia_core::errors::Result;

use crate::db::{enum_from_db, enum_to_db};
use crate::schema::appointments;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = appointments)]
pub struct AppointmentDB {
    pub id: String,
    pub user_id: String,
    pub counselor_id: String,
    pub title: String,
    pub description: String,
    pub scheduled_date_time: i64,
    pub duration_minutes: i32,
    pub status: String,
    pub kind: String,
    pub location: String,
    pub meeting_link: String,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AppointmentDB {
    pub fn from_domain(appointment: Appointment) -> Result<Self> {
        Ok(Self {
            id: appointment.id,
            user_id: appointment.user_id,
            counselor_id: appointment.counselor_id,
            title: appointment.title,
            description: appointment.description,
            scheduled_date_time: appointment.scheduled_date_time,
            duration_minutes: appointment.duration_minutes,
            status: enum_to_db(&appointment.status)?,
            kind: enum_to_db(&appointment.kind)?,
            location: appointment.location,
            meeting_link: appointment.meeting_link,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        })
    }

    pub fn into_domain(self) -> Result<Appointment> {
        Ok(Appointment {
            id: self.id,
            user_id: self.user_id,
            counselor_id: self.counselor_id,
            title: self.title,
            description: self.description,
            scheduled_date_time: self.scheduled_date_time,
            duration_minutes: self.duration_minutes,
            status: enum_from_db(&self.status)?,
            kind: enum_from_db(&self.kind)?,
            location: self.location,
            meeting_link: self.meeting_link,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
