//! Tulia data platform daemon.
//!
//! Builds the service context (SQLite cache, remote document store client,
//! outbox push engine), runs an initial remote sync, then keeps the periodic
//! pusher alive until Ctrl-C.

mod context;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use tulia_core::session::SessionProvider;
use tulia_core::sync::OUTBOX_PUSH_INTERVAL_SECS;

use crate::context::{Config, ServiceContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    info!("starting tulia daemon (data dir: {})", config.data_dir);

    let ctx = Arc::new(ServiceContext::new(&config)?);

    let pending = ctx.outbox.pending_count()?;
    if pending > 0 {
        info!("{} outbox entries pending from a previous run", pending);
    }

    initial_sync(&ctx).await;

    let pusher = ctx.pusher.clone();
    let push_task = tokio::spawn(
        pusher.run_periodic(Duration::from_secs(OUTBOX_PUSH_INTERVAL_SECS)),
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    push_task.abort();

    Ok(())
}

/// Warm the cache from the remote store. Failures are logged and tolerated;
/// the daemon still serves whatever the cache already holds.
async fn initial_sync(ctx: &ServiceContext) {
    match ctx.counselors.sync_from_remote().await {
        Ok(counselors) => info!("synced {} counselors", counselors.len()),
        Err(err) => warn!("counselor sync failed: {}", err),
    }

    match ctx.resources.sync_from_remote().await {
        Ok(resources) => info!("synced {} resources", resources.len()),
        Err(err) => warn!("resource sync failed: {}", err),
    }

    if let Ok(user_id) = ctx.session.current_user_id() {
        match ctx.users.sync_from_remote(&user_id).await {
            Ok(Some(user)) => info!("signed in as {}", user.full_name()),
            Ok(None) => warn!("user {} not found on the remote", user_id),
            Err(err) => warn!("user sync failed: {}", err),
        }
        match ctx.appointments.sync_from_remote(&user_id).await {
            Ok(appointments) => info!("synced {} appointments", appointments.len()),
            Err(err) => warn!("appointment sync failed: {}", err),
        }
    } else {
        info!("no user configured; skipping account sync");
    }
}
