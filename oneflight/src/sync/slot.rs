//! Single-write result slot.
//!
//! The first [`ResultChannel::write`] stores the outcome and wakes every
//! blocked reader; later writes are ignored. Reads never mutate the stored
//! outcome, so a reader that gives up on a deadline leaves the slot ready for
//! a late completion. Cancelling readers only interrupts waits: the slot
//! still accepts the real outcome and reports it through
//! [`ResultChannel::is_resolved`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{Timeout, wait_on};
use crate::executor::types::{ExecError, Failure, Outcome};

#[derive(Debug)]
enum Slot<T> {
    Empty,
    Filled(Outcome<T>),
    /// Outcome was moved out by its only reader.
    Taken,
}

#[derive(Debug)]
struct SlotState<T> {
    slot: Slot<T>,
    readers_cancelled: bool,
}

/// Capacity-1 hand-off of a terminal [`Outcome`].
#[derive(Debug)]
pub struct ResultChannel<T> {
    state: Mutex<SlotState<T>>,
    cvar: Condvar,
}

impl<T> Default for ResultChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultChannel<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                slot: Slot::Empty,
                readers_cancelled: false,
            }),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `outcome` if the slot is still pending.
    ///
    /// Returns `true` if this call stored the outcome.
    pub fn write(&self, outcome: Outcome<T>) -> bool {
        let mut state = self.lock();
        if !matches!(state.slot, Slot::Empty) {
            return false;
        }
        state.slot = Slot::Filled(outcome);
        drop(state);
        self.cvar.notify_all();
        true
    }

    /// Blocks until an outcome exists and returns a copy of it.
    ///
    /// # Errors
    ///
    /// The stored [`Failure`], [`ExecError::Timeout`] if `timeout` expires
    /// first, [`ExecError::Cancelled`] once readers were cancelled, or
    /// [`ExecError::Consumed`] after [`ResultChannel::take`].
    pub fn read(&self, timeout: Timeout) -> Result<T, ExecError>
    where
        T: Clone,
    {
        self.wait_with(timeout, |slot| match slot {
            Slot::Filled(outcome) => Some(outcome.clone().map_err(ExecError::Failed)),
            Slot::Taken => Some(Err(ExecError::Consumed)),
            Slot::Empty => None,
        })
    }

    /// Blocks until an outcome exists without copying the value.
    ///
    /// # Errors
    ///
    /// Same as [`ResultChannel::read`].
    pub fn wait(&self, timeout: Timeout) -> Result<(), ExecError> {
        self.wait_with(timeout, |slot| match slot {
            Slot::Filled(Ok(_)) => Some(Ok(())),
            Slot::Filled(Err(failure)) => Some(Err(ExecError::Failed(failure.clone()))),
            Slot::Taken => Some(Err(ExecError::Consumed)),
            Slot::Empty => None,
        })
    }

    /// Blocks until an outcome exists and moves it out of the slot.
    ///
    /// After a successful take the slot stays closed to further writes.
    ///
    /// # Errors
    ///
    /// Same as [`ResultChannel::read`].
    pub fn take(&self, timeout: Timeout) -> Result<T, ExecError> {
        let deadline = timeout.deadline();
        let mut state = self.lock();
        loop {
            if state.readers_cancelled {
                return Err(ExecError::Cancelled);
            }
            match std::mem::replace(&mut state.slot, Slot::Taken) {
                Slot::Filled(outcome) => return outcome.map_err(ExecError::Failed),
                Slot::Taken => return Err(ExecError::Consumed),
                Slot::Empty => state.slot = Slot::Empty,
            }
            state = match wait_on(&self.cvar, state, deadline) {
                Ok(guard) => guard,
                Err(_) => return Err(ExecError::Timeout(timeout.as_duration())),
            };
        }
    }

    fn wait_with<R>(
        &self,
        timeout: Timeout,
        mut resolve: impl FnMut(&Slot<T>) -> Option<Result<R, ExecError>>,
    ) -> Result<R, ExecError> {
        let deadline = timeout.deadline();
        let mut state = self.lock();
        loop {
            if state.readers_cancelled {
                return Err(ExecError::Cancelled);
            }
            if let Some(result) = resolve(&state.slot) {
                return result;
            }
            state = match wait_on(&self.cvar, state, deadline) {
                Ok(guard) => guard,
                Err(_) => return Err(ExecError::Timeout(timeout.as_duration())),
            };
        }
    }

    /// Interrupts current and future reads with [`ExecError::Cancelled`].
    ///
    /// Has no effect once an outcome is stored. Returns `true` if readers
    /// were cancelled by this call.
    pub fn cancel_readers(&self) -> bool {
        let mut state = self.lock();
        if state.readers_cancelled || !matches!(state.slot, Slot::Empty) {
            return false;
        }
        state.readers_cancelled = true;
        drop(state);
        self.cvar.notify_all();
        true
    }

    /// Whether a terminal outcome has been written, regardless of readers.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self.lock().slot, Slot::Empty)
    }

    /// Whether readers of this slot were cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.lock().readers_cancelled
    }

    /// Returns the stored failure, if the outcome is a failure.
    #[must_use]
    pub fn failure(&self) -> Option<Failure> {
        match &self.lock().slot {
            Slot::Filled(Err(failure)) => Some(failure.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::OperationError;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_first_write_wins() {
        let channel = ResultChannel::<u32>::new();
        assert!(!channel.is_resolved());
        assert!(channel.write(Ok(1)));
        assert!(!channel.write(Ok(2)));
        assert!(!channel.write(Err(Failure::Status(3))));
        assert_eq!(channel.read(Timeout::Infinite).unwrap(), 1);
    }

    #[test]
    fn test_cached_outcome_satisfies_repeated_reads() {
        let channel = ResultChannel::<String>::new();
        channel.write(Ok("R".to_string()));
        for _ in 0..3 {
            assert_eq!(channel.read(Timeout::Infinite).unwrap(), "R");
        }
        assert!(channel.wait(Timeout::Infinite).is_ok());
    }

    #[test]
    fn test_read_returns_stored_failure() {
        let channel = ResultChannel::<u32>::new();
        channel.write(Err(OperationError::new("boom").into()));
        match channel.read(Timeout::Infinite) {
            Err(ExecError::Failed(Failure::Operation(e))) => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(channel.failure(), Some(Failure::Operation(_))));
    }

    #[test]
    fn test_read_timeout_leaves_slot_writable() {
        let channel = ResultChannel::<u32>::new();
        let start = Instant::now();
        let err = channel
            .read(Timeout::Duration(Duration::from_millis(25)))
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout(d) if d == Duration::from_millis(25)));
        assert!(start.elapsed() >= Duration::from_millis(25));

        assert!(channel.write(Ok(7)));
        assert_eq!(channel.read(Timeout::Infinite).unwrap(), 7);
    }

    #[test]
    fn test_huge_timeout_reads_resolved_slot() {
        let channel = ResultChannel::<u32>::new();
        channel.write(Ok(11));
        assert_eq!(channel.read(Timeout::Duration(Duration::MAX)).unwrap(), 11);
        assert_eq!(channel.take(Timeout::Duration(Duration::MAX)).unwrap(), 11);
    }

    #[test]
    fn test_blocked_reader_wakes_on_write() {
        let channel = Arc::new(ResultChannel::<u32>::new());
        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.read(Timeout::Duration(Duration::from_secs(5))))
        };
        thread::sleep(Duration::from_millis(10));
        channel.write(Ok(42));
        assert_eq!(reader.join().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_cancel_interrupts_reader_but_not_writer() {
        let channel = Arc::new(ResultChannel::<u32>::new());
        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.read(Timeout::Infinite))
        };
        thread::sleep(Duration::from_millis(10));
        assert!(channel.cancel_readers());
        assert!(matches!(reader.join().unwrap(), Err(ExecError::Cancelled)));

        // A late completion is still stored, just unobserved by readers.
        assert!(channel.write(Ok(9)));
        assert!(channel.is_resolved());
        assert!(matches!(
            channel.read(Timeout::Infinite),
            Err(ExecError::Cancelled)
        ));
    }

    #[test]
    fn test_cancel_after_resolution_is_noop() {
        let channel = ResultChannel::<u32>::new();
        channel.write(Ok(5));
        assert!(!channel.cancel_readers());
        assert!(!channel.is_cancelled());
        assert_eq!(channel.read(Timeout::Infinite).unwrap(), 5);
    }

    #[test]
    fn test_take_moves_value_and_closes_slot() {
        let channel = ResultChannel::<Vec<u8>>::new();
        channel.write(Ok(vec![1, 2, 3]));
        assert_eq!(channel.take(Timeout::Infinite).unwrap(), vec![1, 2, 3]);
        assert!(channel.is_resolved());
        assert!(!channel.write(Ok(vec![4])));
        assert!(matches!(
            channel.take(Timeout::Infinite),
            Err(ExecError::Consumed)
        ));
        assert!(matches!(
            channel.read(Timeout::Infinite),
            Err(ExecError::Consumed)
        ));
    }

    #[test]
    fn test_take_times_out_on_empty_slot() {
        let channel = ResultChannel::<u32>::new();
        assert!(matches!(
            channel.take(Timeout::Duration(Duration::from_millis(5))),
            Err(ExecError::Timeout(_))
        ));
        assert!(!channel.is_resolved());
        assert!(channel.write(Ok(1)));
    }
}
