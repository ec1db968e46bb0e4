//! Dedicated writer thread.
//!
//! SQLite allows one writer at a time; funneling every mutation through a
//! single thread turns lock contention into queueing. Each job runs inside
//! an immediate transaction, so a cache mutation and its outbox row commit
//! or roll back together.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::{error, warn};
use std::sync::mpsc;

use tulia_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Cloneable handle to the writer thread. Dropping the last handle shuts
/// the thread down once its queue drains.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Job>,
}

/// Threads the caller's error through diesel's transaction plumbing.
enum TxError {
    App(Error),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Db(err)
    }
}

impl WriteHandle {
    /// Run `job` on the writer thread inside an immediate transaction and
    /// await its result.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<Result<T>>();

        let wrapped: Job = Box::new(move |conn| {
            let result = conn
                .immediate_transaction::<T, TxError, _>(|tx| job(tx).map_err(TxError::App))
                .map_err(|err| match err {
                    TxError::App(e) => e,
                    TxError::Db(e) => Error::from(StorageError::from(e)),
                });
            if done_tx.send(result).is_err() {
                warn!("write job finished but the caller went away");
            }
        });

        self.tx.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "write actor is no longer running".to_string(),
            ))
        })?;

        done_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "write actor dropped the job".to_string(),
            ))
        })?
    }
}

/// Start the writer thread against its own pooled connection.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (tx, rx) = mpsc::channel::<Job>();

    std::thread::Builder::new()
        .name("tulia-db-writer".to_string())
        .spawn(move || {
            while let Ok(job) = rx.recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    Err(err) => {
                        // The job's oneshot sender is dropped with it; the
                        // caller sees a channel error.
                        error!("writer could not get a connection: {err}");
                    }
                }
            }
        })
        .expect("failed to spawn database writer thread");

    WriteHandle { tx }
}
