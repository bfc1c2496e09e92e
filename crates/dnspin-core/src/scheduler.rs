//! Fixed-interval scheduler with cooperative shutdown
//!
//! Drives a [`Reconciler`] once immediately, then again every poll
//! interval, indefinitely, until a stop signal is received.
//!
//! ## State machine
//!
//! ```text
//! Idle ──start──▶ Reconciling ──pass done──▶ WaitingForNextTick
//!                     ▲                        │          │
//!                     └────────timer expiry────┘          │ stop
//!                                                         ▼
//!                                                      Stopped
//! ```
//!
//! A stop observed while waiting interrupts the wait immediately. A stop
//! requested while a pass is in flight is deferred until the pass returns —
//! the scheduler never preempts an in-flight remote call. Passes execute in
//! strict sequence and never overlap, so the engine needs no internal
//! locking.

use crate::engine::Reconciler;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Fixed-interval driver for a [`Reconciler`]
///
/// ## Usage
///
/// ```rust,ignore
/// let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
/// let scheduler = Scheduler::new(engine, config.poll_interval());
/// let handle = tokio::spawn(scheduler.run(stop_rx));
///
/// // ... later, request a graceful stop:
/// stop_tx.send(true).ok();
/// handle.await?;
/// ```
pub struct Scheduler<T: Reconciler> {
    task: T,
    poll_interval: Duration,
}

impl<T: Reconciler> Scheduler<T> {
    /// Create a scheduler driving `task` every `poll_interval`
    pub fn new(task: T, poll_interval: Duration) -> Self {
        Self {
            task,
            poll_interval,
        }
    }

    /// Run until the shutdown flag flips to `true`
    ///
    /// The first pass starts immediately. The loop only ever exits on the
    /// shutdown signal — a pass absorbs its own failures, so there is no
    /// error path out of here. Dropping the sender counts as a stop
    /// request.
    ///
    /// Returns the driven task so callers can inspect its final state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> T {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.task.reconcile().await;

            // A stop requested mid-pass takes effect now, before waiting.
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {
                    debug!("poll interval elapsed");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped: treat as a stop request.
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
        self.task
    }
}
