use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::broadcast;

use tulia_core::counselors::{Counselor, CounselorCache};
use tulia_core::errors::Result;
use tulia_core::sync::OutboxWriteRequest;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::write_outbox_request;
use crate::schema::counselors;

use super::CounselorDB;

pub struct CounselorStore {
    pool: DbPool,
    writer: WriteHandle,
    changed: broadcast::Sender<()>,
}

impl CounselorStore {
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

    fn rows_to_domain(rows: Vec<CounselorDB>) -> Result<Vec<Counselor>> {
        rows.into_iter().map(CounselorDB::into_domain).collect()
    }
}

#[async_trait]
impl CounselorCache for CounselorStore {
    fn get_by_id(&self, counselor_id: &str) -> Result<Option<Counselor>> {
        let mut conn = get_connection(&self.pool)?;
        let row = counselors::table
            .find(counselor_id)
            .first::<CounselorDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(CounselorDB::into_domain).transpose()
    }

    fn list_all(&self) -> Result<Vec<Counselor>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = counselors::table
            .order(counselors::last_name.asc())
            .load::<CounselorDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_available(&self) -> Result<Vec<Counselor>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = counselors::table
            .filter(counselors::is_available.eq(true))
            .order(counselors::last_name.asc())
            .load::<CounselorDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_rating_desc(&self) -> Result<Vec<Counselor>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = counselors::table
            .order(counselors::rating.desc())
            .load::<CounselorDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_specialization(&self, specialization: &str) -> Result<Vec<Counselor>> {
        let mut conn = get_connection(&self.pool)?;
        let pattern = format!("%{}%", specialization);
        let rows = counselors::table
            .filter(counselors::specializations.like(pattern))
            .order(counselors::rating.desc())
            .load::<CounselorDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn changes(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    async fn upsert(&self, counselor: Counselor) -> Result<()> {
        let row = CounselorDB::from_domain(counselor)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(counselors::table)
                    .values(&row)
                    .on_conflict(counselors::id)
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

    async fn upsert_many(&self, counselor_list: Vec<Counselor>) -> Result<()> {
        if counselor_list.is_empty() {
            return Ok(());
        }
        let rows = counselor_list
            .into_iter()
            .map(CounselorDB::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.writer
            .exec(move |conn| {
                for row in &rows {
                    diesel::insert_into(counselors::table)
                        .values(row)
                        .on_conflict(counselors::id)
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

    async fn update(&self, counselor: Counselor, intent: OutboxWriteRequest) -> Result<()> {
        let row = CounselorDB::from_domain(counselor)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(counselors::table)
                    .values(&row)
                    .on_conflict(counselors::id)
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

    async fn set_availability(
        &self,
        counselor_id: &str,
        is_available: bool,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let counselor_id = counselor_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(counselors::table.find(&counselor_id))
                    .set(counselors::is_available.eq(is_available))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }
}
