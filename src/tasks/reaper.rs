//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

/// How long [`Reaper::stop`] waits for the task before aborting it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Owned handle to a running sweep task.
///
/// Dropping the handle without calling [`stop`](Self::stop) also ends the task
/// at its next wake-up, since the stop channel closes.
#[derive(Debug)]
pub struct Reaper {
    handle: JoinHandle<()>,
    stop_tx: oneshot::Sender<()>,
}

impl Reaper {
    /// Spawns a task sweeping `store` every `period`.
    ///
    /// The task holds only a weak reference, so it ends on its own once the
    /// last cache handle is gone. Must be called from within a tokio runtime.
    pub fn spawn(store: Weak<RwLock<CacheStore>>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            info!("Starting TTL reaper with period of {:?}", period);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("TTL reaper received stop signal");
                        break;
                    }
                    _ = tokio::time::sleep(period) => {}
                }

                let Some(store) = store.upgrade() else {
                    debug!("Cache dropped, TTL reaper exiting");
                    break;
                };

                let removed = {
                    let mut guard = store.write().await;
                    guard.sweep_expired()
                };

                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
        });

        Self { handle, stop_tx }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the task and waits up to [`SHUTDOWN_GRACE`] for it to exit,
    /// aborting it after that.
    pub async fn stop(self) {
        let Reaper {
            mut handle,
            stop_tx,
        } = self;
        // The task may already have exited on its own.
        let _ = stop_tx.send(());

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(())) => info!("TTL reaper stopped"),
            Ok(Err(err)) => warn!("TTL reaper ended abnormally: {}", err),
            Err(_) => {
                warn!("TTL reaper did not stop within {:?}, aborting", SHUTDOWN_GRACE);
                handle.abort();
            }
        }
    }
}
