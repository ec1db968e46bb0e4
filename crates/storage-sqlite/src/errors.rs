//! Storage-side error type, converted into the core error at the seam.

use thiserror::Error;
use tulia_core::errors::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Storage error: {0}")]
    Internal(String),
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Connection(err.to_string())
    }
}

impl From<diesel::ConnectionError> for StorageError {
    fn from(err: diesel::ConnectionError) -> Self {
        StorageError::Connection(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db = match err {
            StorageError::Connection(msg) => DatabaseError::Connection(msg),
            StorageError::Query(e) => DatabaseError::Query(e.to_string()),
            StorageError::Migration(msg) => DatabaseError::Migration(msg),
            StorageError::Internal(msg) => DatabaseError::Internal(msg),
        };
        Error::Database(db)
    }
}
