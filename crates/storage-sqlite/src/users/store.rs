use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::broadcast;

use tulia_core::errors::Result;
use tulia_core::sync::OutboxWriteRequest;
use tulia_core::users::{User, UserCache};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::outbox::write_outbox_request;
use crate::schema::users;

use super::UserDB;

pub struct UserStore {
    pool: DbPool,
    writer: WriteHandle,
    changed: broadcast::Sender<()>,
}

impl UserStore {
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
}

#[async_trait]
impl UserCache for UserStore {
    fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .find(user_id)
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::from))
    }

    fn get_by_email(&self, email_value: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .filter(users::email.eq(email_value))
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::from))
    }

    fn get_by_student_id(&self, student_id_value: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .filter(users::student_id.eq(student_id_value))
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::from))
    }

    fn list_all(&self) -> Result<Vec<User>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = users::table
            .order(users::last_name.asc())
            .load::<UserDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    fn changes(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    async fn upsert(&self, user: User) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = UserDB::from(user);
                diesel::insert_into(users::table)
                    .values(&row)
                    .on_conflict(users::id)
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

    async fn upsert_many(&self, user_list: Vec<User>) -> Result<()> {
        if user_list.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn| {
                for user in user_list {
                    let row = UserDB::from(user);
                    diesel::insert_into(users::table)
                        .values(&row)
                        .on_conflict(users::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn update(&self, user: User, intent: OutboxWriteRequest) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = UserDB::from(user);
                diesel::insert_into(users::table)
                    .values(&row)
                    .on_conflict(users::id)
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

    async fn set_last_active(
        &self,
        user_id: &str,
        timestamp: i64,
        intent: OutboxWriteRequest,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(users::table.find(&user_id))
                    .set(users::last_active.eq(timestamp))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_request(conn, &intent)
            })
            .await?;
        self.notify();
        Ok(())
    }

    async fn delete_by_id(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(users::table.find(user_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(())
    }
}
