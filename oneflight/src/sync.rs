//! Blocking primitives for in-process hand-off between caller, executor and
//! controller threads.
//!
//! - [`gate`]: capacity-1 FIFO admission gate.
//! - [`slot`]: single-write result slot read by a caller's handle.

pub mod gate;
pub mod slot;

use std::sync::{Condvar, MutexGuard, PoisonError};
use std::time::Duration;

use minstant::Instant;

/// Timeout for blocking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl Timeout {
    /// Absolute deadline for this timeout.
    ///
    /// `None` when infinite, or when the bound lies beyond what an
    /// [`Instant`] can represent, which waits the same way.
    #[inline]
    pub(crate) fn deadline(self) -> Option<Instant> {
        match self {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Instant::now().checked_add(d),
        }
    }

    /// The bound as a duration; [`Duration::MAX`] when infinite.
    #[inline]
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        match self {
            Timeout::Infinite => Duration::MAX,
            Timeout::Duration(d) => d,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Parks on `cvar` until notified or `deadline` passes.
///
/// Returns `Err(guard)` without waiting if the deadline has already passed,
/// so callers re-check their predicate before deciding they timed out.
/// Poisoned locks are recovered: every critical section in this crate leaves
/// its state consistent before any user code can panic.
pub(crate) fn wait_on<'a, S>(
    cvar: &Condvar,
    guard: MutexGuard<'a, S>,
    deadline: Option<Instant>,
) -> Result<MutexGuard<'a, S>, MutexGuard<'a, S>> {
    let Some(dl) = deadline else {
        return Ok(cvar.wait(guard).unwrap_or_else(PoisonError::into_inner));
    };
    match dl.checked_duration_since(Instant::now()) {
        Some(remaining) if !remaining.is_zero() => Ok(cvar
            .wait_timeout(guard, remaining)
            .map_or_else(|e| e.into_inner().0, |(g, _)| g)),
        _ => Err(guard),
    }
}
