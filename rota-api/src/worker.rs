use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::SessionStore;

/// Periodically drops sessions idle for `ttl` until `cancel` fires
pub fn start_session_sweeper(
    sessions: Arc<SessionStore>,
    ttl: Duration,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(ttl_secs = ttl.as_secs(), "Session sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = sessions.sweep(ttl).await;
                    if removed > 0 {
                        info!(removed, "Expired idle booking sessions");
                    } else {
                        debug!("No idle sessions to expire");
                    }
                }
            }
        }
        info!("Session sweeper stopped");
    })
}
