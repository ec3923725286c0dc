use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodic refresh of one query.
///
/// The task fetches immediately, then every `interval`. Changing the key
/// restarts the cycle with an immediate fetch for the new key. Dropping the
/// poller, or calling [`AvailabilityPoller::shutdown`], stops the task.
#[derive(Debug)]
pub struct AvailabilityPoller<K> {
    key_tx: watch::Sender<Option<K>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<K> AvailabilityPoller<K>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(interval: Duration, initial: Option<K>, refresh: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (key_tx, mut key_rx) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(interval_ms = interval.as_millis() as u64, "Availability poller started");

            loop {
                let key = tokio::select! {
                    _ = token.cancelled() => break,
                    changed = key_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        ticker.reset();
                        key_rx.borrow_and_update().clone()
                    }
                    _ = ticker.tick() => key_rx.borrow().clone(),
                };

                if let Some(key) = key {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = refresh(key) => {}
                    }
                }
            }
            tracing::debug!("Availability poller stopped");
        });

        Self {
            key_tx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Re-targets the poller; a no-op if the key is unchanged
    pub fn set_key(&self, key: Option<K>) {
        self.key_tx.send_if_modified(|current| {
            if *current == key {
                false
            } else {
                *current = key;
                true
            }
        });
    }

    pub fn key(&self) -> Option<K> {
        self.key_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops polling and waits for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Availability poller task ended abnormally");
            }
        }
    }
}

impl<K> Drop for AvailabilityPoller<K> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
