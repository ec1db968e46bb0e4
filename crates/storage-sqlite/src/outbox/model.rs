use diesel::prelude::*;

use tulia_core::errors::Result;
use tulia_core::sync::OutboxEntry;

use crate::db::{enum_from_db, enum_to_db};
use crate::schema::outbox;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = outbox)]
pub struct OutboxEventDB {
    pub event_id: String,
    pub collection: String,
    pub document_id: String,
    pub op: String,
    pub payload: String,
    pub status: String,
    pub retry_count: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}

impl OutboxEventDB {
    pub fn into_entry(self) -> Result<OutboxEntry> {
        Ok(OutboxEntry {
            event_id: self.event_id,
            collection: self.collection,
            document_id: self.document_id,
            op: enum_from_db(&self.op)?,
            payload: serde_json::from_str(&self.payload).map_err(tulia_core::Error::from)?,
            status: enum_from_db(&self.status)?,
            retry_count: self.retry_count,
            next_retry_at: self.next_retry_at,
            last_error: self.last_error,
            created_at: self.created_at,
        })
    }

    pub fn from_entry(entry: &OutboxEntry) -> Result<Self> {
        Ok(Self {
            event_id: entry.event_id.clone(),
            collection: entry.collection.clone(),
            document_id: entry.document_id.clone(),
            op: enum_to_db(&entry.op)?,
            payload: serde_json::to_string(&entry.payload).map_err(tulia_core::Error::from)?,
            status: enum_to_db(&entry.status)?,
            retry_count: entry.retry_count,
            next_retry_at: entry.next_retry_at.clone(),
            last_error: entry.last_error.clone(),
            created_at: entry.created_at.clone(),
        })
    }
}
