//! Expiry Sweep Task
//!
//! Background task that periodically drops expired entries from every named
//! cache. Expiry is already enforced lazily on read, so the sweep only
//! reclaims memory held by entries nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::caches::AppCaches;

/// Spawns a background task that purges expired entries every
/// `interval_secs` seconds.
///
/// The returned handle is aborted during graceful shutdown. Callers decide
/// whether to spawn at all; an interval of zero is treated as one second so
/// the loop never spins.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(caches.clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(caches: AppCaches, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs, "starting expiry sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = caches.purge_expired();
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
