use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::broadcast;

use tulia_core::errors::Result;
use tulia_core::resources::{Resource, ResourceCache, ResourceCategory, ResourceKind};
use tulia_core::sync::OutboxWriteRequest;

use crate::db::{enum_to_db, get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::write_outbox_request;
use crate::schema::resources;

use super::ResourceDB;

pub struct ResourceStore {
    pool: DbPool,
    writer: WriteHandle,
    changed: broadcast::Sender<()>,
}

/// Upsert that leaves `is_bookmarked` alone on conflict. The bookmark flag
/// lives only in the cache, so a remote document must never reset it.
fn upsert_preserving_bookmark(
    conn: &mut SqliteConnection,
    row: &ResourceDB,
) -> std::result::Result<(), StorageError> {
    diesel::insert_into(resources::table)
        .values(row)
        .on_conflict(resources::id)
        .do_update()
        .set((
            resources::title.eq(&row.title),
            resources::description.eq(&row.description),
            resources::content.eq(&row.content),
            resources::category.eq(&row.category),
            resources::kind.eq(&row.kind),
            resources::image_url.eq(&row.image_url),
            resources::video_url.eq(&row.video_url),
            resources::audio_url.eq(&row.audio_url),
            resources::pdf_url.eq(&row.pdf_url),
            resources::tags.eq(&row.tags),
            resources::author.eq(&row.author),
            resources::reading_time_minutes.eq(row.reading_time_minutes),
            resources::likes.eq(row.likes),
            resources::views.eq(row.views),
            resources::created_at.eq(row.created_at),
            resources::updated_at.eq(row.updated_at),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

impl ResourceStore {
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

    fn rows_to_domain(rows: Vec<ResourceDB>) -> Result<Vec<Resource>> {
        rows.into_iter().map(ResourceDB::into_domain).collect()
    }
}

#[async_trait]
impl ResourceCache for ResourceStore {
    fn get_by_id(&self, resource_id: &str) -> Result<Option<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let row = resources::table
            .find(resource_id)
            .first::<ResourceDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(ResourceDB::into_domain).transpose()
    }

    fn list_all(&self) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resources::table
            .order(resources::created_at.desc())
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_category(&self, category: ResourceCategory) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resources::table
            .filter(resources::category.eq(enum_to_db(&category)?))
            .order(resources::created_at.desc())
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resources::table
            .filter(resources::kind.eq(enum_to_db(&kind)?))
            .order(resources::created_at.desc())
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_bookmarked(&self) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resources::table
            .filter(resources::is_bookmarked.eq(true))
            .order(resources::created_at.desc())
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn search(&self, query: &str) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let pattern = format!("%{}%", query);
        let rows = resources::table
            .filter(
                resources::title
                    .like(&pattern)
                    .or(resources::description.like(&pattern))
                    .or(resources::tags.like(&pattern)),
            )
            .order(resources::created_at.desc())
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn list_popular(&self, limit: i64) -> Result<Vec<Resource>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resources::table
            .order(resources::likes.desc())
            .limit(limit)
            .load::<ResourceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::rows_to_domain(rows)
    }

    fn changes(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    async fn upsert(&self, resource: Resource) -> Result<()> {
        let row = ResourceDB::from_domain(resource)?;
        self.writer
            .exec(move |conn| {
                upsert_preserving_bookmark(conn, &row)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn upsert_many(&self, resource_list: Vec<Resource>) -> Result<()> {
        if resource_list.is_empty() {
            return Ok(());
        }
        let rows = resource_list
            .into_iter()
            .map(ResourceDB::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.writer
            .exec(move |conn| {
                for row in &rows {
                    upsert_preserving_bookmark(conn, row)?;
                }
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn update(&self, resource: Resource, intent: OutboxWriteRequest) -> Result<()> {
        let row = ResourceDB::from_domain(resource)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(resources::table)
                    .values(&row)
                    .on_conflict(resources::id)
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

    async fn set_bookmarked(&self, resource_id: &str, is_bookmarked: bool) -> Result<()> {
        let resource_id = resource_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(resources::table.find(&resource_id))
                    .set(resources::is_bookmarked.eq(is_bookmarked))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn increment_views(&self, resource_id: &str, intent: OutboxWriteRequest) -> Result<()> {
        let resource_id = resource_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(resources::table.find(&resource_id))
                    .set(resources::views.eq(resources::views + 1))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn increment_likes(&self, resource_id: &str, intent: OutboxWriteRequest) -> Result<()> {
        let resource_id = resource_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(resources::table.find(&resource_id))
                    .set(resources::likes.eq(resources::likes + 1))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }
}
