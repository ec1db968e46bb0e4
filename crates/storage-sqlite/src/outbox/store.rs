use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use tulia_core::errors::Result;
use tulia_core::sync::{OutboxEntry, OutboxQueue, OutboxStatus, OutboxWriteRequest};

use crate::db::{enum_to_db, get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::model::OutboxEventDB;
use crate::schema::outbox;

/// Insert one intent row. Called by the entity stores inside the same
/// writer transaction as the cache mutation, so both commit or neither
/// does.
pub fn write_outbox_request(
    conn: &mut SqliteConnection,
    request: &OutboxWriteRequest,
) -> Result<()> {
    let row = OutboxEventDB {
        event_id: request.event_id.clone(),
        collection: request.collection.clone(),
        document_id: request.document_id.clone(),
        op: enum_to_db(&request.op)?,
        payload: serde_json::to_string(&request.payload).map_err(tulia_core::Error::from)?,
        status: enum_to_db(&OutboxStatus::Pending)?,
        retry_count: 0,
        next_retry_at: None,
        last_error: None,
        created_at: request.created_at.clone(),
    };
    diesel::insert_into(outbox::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// The outbox table as seen by the push engine.
pub struct OutboxStore {
    pool: DbPool,
    writer: WriteHandle,
}

impl OutboxStore {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Pending rows, due or not. Reported at startup and used by tests.
    pub fn pending_count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = outbox::table
            .filter(outbox::status.eq(enum_to_db(&OutboxStatus::Pending)?))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    pub fn get_by_event_id(&self, event_id_value: &str) -> Result<Option<OutboxEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let row = outbox::table
            .find(event_id_value)
            .first::<OutboxEventDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(OutboxEventDB::into_entry).transpose()
    }
}

#[async_trait]
impl OutboxQueue for OutboxStore {
    fn list_due(&self, limit_value: i64) -> Result<Vec<OutboxEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now().to_rfc3339();

        let rows = outbox::table
            .filter(outbox::status.eq(enum_to_db(&OutboxStatus::Pending)?))
            .filter(
                outbox::next_retry_at
                    .is_null()
                    .or(outbox::next_retry_at.le(now)),
            )
            .order(outbox::created_at.asc())
            .limit(limit_value)
            .load::<OutboxEventDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(OutboxEventDB::into_entry).collect()
    }

    async fn mark_sent(&self, event_ids: Vec<String>) -> Result<()> {
        if event_ids.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn| {
                diesel::update(outbox::table.filter(outbox::event_id.eq_any(event_ids)))
                    .set((
                        outbox::status.eq(enum_to_db(&OutboxStatus::Sent)?),
                        outbox::next_retry_at.eq::<Option<String>>(None),
                        outbox::last_error.eq::<Option<String>>(None),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn schedule_retry(
        &self,
        event_ids: Vec<String>,
        backoff_seconds: i64,
        last_error: Option<String>,
    ) -> Result<()> {
        if event_ids.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn| {
                let retry_at = (Utc::now() + Duration::seconds(backoff_seconds)).to_rfc3339();
                diesel::update(outbox::table.filter(outbox::event_id.eq_any(event_ids)))
                    .set((
                        outbox::retry_count.eq(outbox::retry_count + 1),
                        outbox::next_retry_at.eq(Some(retry_at)),
                        outbox::status.eq(enum_to_db(&OutboxStatus::Pending)?),
                        outbox::last_error.eq(last_error),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_dead(&self, event_ids: Vec<String>, last_error: Option<String>) -> Result<()> {
        if event_ids.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn| {
                diesel::update(outbox::table.filter(outbox::event_id.eq_any(event_ids)))
                    .set((
                        outbox::status.eq(enum_to_db(&OutboxStatus::Dead)?),
                        outbox::last_error.eq(last_error),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
