//! Stuck-operation watchdog.
//!
//! Wakes every [`ExecutorConfig::watchdog_interval`](super::ExecutorConfig)
//! and fails asynchronous operations that have held the permit longer than
//! the configured stuck timeout. Synchronous operations are never abandoned. Holds only a weak reference to the executor, so dropping the
//! last [`Executor`](super::Executor) handle ends the thread.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::Inner;
use crate::trace::{debug, info};

pub(super) fn spawn<T: Send + 'static>(
    inner: &Arc<Inner<T>>,
    stuck_timeout: Duration,
) -> io::Result<JoinHandle<()>> {
    let weak: Weak<Inner<T>> = Arc::downgrade(inner);
    let shutdown = Arc::clone(&inner.shutdown);
    let interval = inner.config.watchdog_interval;

    debug!(
        stuck_timeout_ms = stuck_timeout.as_millis() as u64,
        interval_ms = interval.as_millis() as u64,
        "spawning watchdog thread"
    );
    thread::Builder::new()
        .name(format!("{}-watchdog", inner.config.name))
        .spawn(move || {
            info!("watchdog thread started");
            while !shutdown.load(Ordering::Acquire) {
                thread::park_timeout(interval);
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.reclaim_stuck(stuck_timeout);
            }
            info!("watchdog thread exiting");
        })
}
