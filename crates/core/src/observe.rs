//! Live cache queries.
//!
//! A repository observation is a `watch` channel fed by a background task:
//! one initial query, then a re-query every time the backing store signals a
//! committed write. Values therefore arrive in local commit order. The task
//! ends when the last receiver is dropped.

use log::warn;
use tokio::sync::{broadcast, watch};

use crate::errors::Result;

/// Spawn a refresh task bridging a store's change signal to a `watch`
/// receiver holding the latest query result.
pub fn live_query<T, F>(mut changes: broadcast::Receiver<()>, query: F) -> watch::Receiver<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Result<Vec<T>> + Send + 'static,
{
    let initial = match query() {
        Ok(rows) => rows,
        Err(err) => {
            warn!("live query failed on initial load: {}", err);
            Vec::new()
        }
    };
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
            let rows = match query() {
                Ok(rows) => rows,
                Err(err) => {
                    warn!("live query refresh failed: {}", err);
                    continue;
                }
            };
            if tx.send(rows).is_err() {
                break;
            }
        }
    });

    rx
}
