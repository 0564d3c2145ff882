//! Background removal of expired sessions.

use chrono::Utc;
use std::time::Duration;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, info};

use crate::store::{sessions, Store};

/// Purge expired sessions now and then every `interval` until the task is
/// aborted.
pub fn spawn_session_sweeper(store: Store, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Session sweeper running every {}s", interval.as_secs());

        loop {
            sweep_once(&store).await;
            sleep(interval).await;
        }
    })
}

async fn sweep_once(store: &Store) -> u64 {
    match sessions::purge_expired(store, Utc::now().timestamp()).await {
        Ok(0) => 0,
        Ok(removed) => {
            debug!(removed, "Purged expired sessions");
            removed
        }
        Err(err) => {
            error!("Session sweep failed: {err:#}");
            0
        }
    }
}
