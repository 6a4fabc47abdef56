//! Executor counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of an executor's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Operations that acquired the permit.
    pub admitted: u64,
    /// Admitted operations whose outcome was delivered by a completion.
    pub completed: u64,
    /// Notify calls for ids that were absent (duplicate, late or unknown).
    pub ignored_notifications: u64,
    /// Queued operations that gave up waiting for the permit.
    pub admission_timeouts: u64,
    /// Admitted operations failed by the watchdog.
    pub abandoned: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    admitted: AtomicU64,
    completed: AtomicU64,
    ignored_notifications: AtomicU64,
    admission_timeouts: AtomicU64,
    abandoned: AtomicU64,
}

impl Counters {
    pub(crate) fn admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn ignored(&self) {
        self.ignored_notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn admission_timeout(&self) {
        self.admission_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            ignored_notifications: self.ignored_notifications.load(Ordering::Relaxed),
            admission_timeouts: self.admission_timeouts.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}
