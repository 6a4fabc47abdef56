//! Capacity-1 admission gate.
//!
//! At most one operation holds the permit at any instant. Blocked waiters
//! take a ticket and are admitted strictly in ticket order; a waiter whose
//! timeout expires withdraws its ticket and leaves no trace. A non-blocking
//! [`AdmissionGate::try_admit`] never overtakes a queued waiter.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{Timeout, wait_on};
use crate::trace::{trace, warn};

#[derive(Debug, Default)]
struct GateState {
    held: bool,
    queue: VecDeque<u64>,
    next_ticket: u64,
}

impl GateState {
    #[inline]
    fn is_free_for(&self, ticket: u64) -> bool {
        !self.held && self.queue.front() == Some(&ticket)
    }
}

/// Single-permit gate guarding the "in-flight" slot of an executor.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    state: Mutex<GateState>,
    cvar: Condvar,
}

impl AdmissionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the permit if it is free and nobody is queued for it.
    #[must_use]
    pub fn try_admit(&self) -> bool {
        let mut state = self.lock();
        if state.held || !state.queue.is_empty() {
            return false;
        }
        state.held = true;
        true
    }

    /// Blocks until the permit is granted or `timeout` expires.
    ///
    /// Returns `false` on timeout; the gate is left exactly as if this call
    /// had never been made.
    #[must_use]
    pub fn admit(&self, timeout: Timeout) -> bool {
        let deadline = timeout.deadline();
        let mut state = self.lock();
        if !state.held && state.queue.is_empty() {
            state.held = true;
            return true;
        }

        let ticket = state.next_ticket;
        state.next_ticket = state.next_ticket.wrapping_add(1);
        state.queue.push_back(ticket);
        trace!(ticket, queued = state.queue.len(), "waiting for admission");

        loop {
            if state.is_free_for(ticket) {
                state.queue.pop_front();
                state.held = true;
                return true;
            }
            match wait_on(&self.cvar, state, deadline) {
                Ok(guard) => state = guard,
                Err(mut guard) => {
                    guard.queue.retain(|t| *t != ticket);
                    drop(guard);
                    // Our ticket may have been blocking the next waiter.
                    self.cvar.notify_all();
                    trace!(ticket, "admission timed out");
                    return false;
                }
            }
        }
    }

    /// Returns the permit to the gate and wakes queued waiters.
    ///
    /// Returns `false` if the permit was not held.
    pub fn release(&self) -> bool {
        let mut state = self.lock();
        if !state.held {
            warn!("release on a gate that is not held");
            return false;
        }
        state.held = false;
        drop(state);
        self.cvar.notify_all();
        true
    }

    /// Whether some operation currently holds the permit.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock().held
    }

    /// Number of blocked waiters queued for the permit.
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.lock().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_try_admit_is_exclusive() {
        let gate = AdmissionGate::new();
        assert!(gate.try_admit());
        assert!(gate.is_held());
        assert!(!gate.try_admit());
        assert!(gate.release());
        assert!(!gate.is_held());
        assert!(gate.try_admit());
    }

    #[test]
    fn test_release_without_permit_is_rejected() {
        let gate = AdmissionGate::new();
        assert!(!gate.release());
        assert!(gate.try_admit());
        assert!(gate.release());
        assert!(!gate.release());
    }

    #[test]
    fn test_admit_times_out_without_side_effects() {
        let gate = AdmissionGate::new();
        assert!(gate.try_admit());

        let start = Instant::now();
        assert!(!gate.admit(Timeout::Duration(Duration::from_millis(30))));
        assert!(start.elapsed() >= Duration::from_millis(30));

        assert_eq!(gate.waiters(), 0);
        assert!(gate.is_held());
        assert!(gate.release());
        assert!(gate.try_admit());
    }

    #[test]
    fn test_admit_wakes_on_release() {
        let gate = Arc::new(AdmissionGate::new());
        assert!(gate.try_admit());

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.admit(Timeout::Infinite))
        };
        wait_until(|| gate.waiters() == 1);
        assert!(gate.release());

        assert!(waiter.join().unwrap());
        assert!(gate.is_held());
        assert_eq!(gate.waiters(), 0);
    }

    #[test]
    fn test_try_admit_does_not_overtake_queued_waiter() {
        let gate = Arc::new(AdmissionGate::new());
        assert!(gate.try_admit());

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let admitted = gate.admit(Timeout::Infinite);
                gate.release();
                admitted
            })
        };
        wait_until(|| gate.waiters() == 1);

        assert!(gate.release());
        // Between the release and the waiter running, the queue is non-empty.
        let overtook = gate.try_admit();
        if overtook {
            // Only possible once the waiter has already been admitted and released.
            assert_eq!(gate.waiters(), 0);
            gate.release();
        }
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_waiters_are_admitted_in_ticket_order() {
        let gate = Arc::new(AdmissionGate::new());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        assert!(gate.try_admit());

        let mut handles = Vec::new();
        for i in 0..4 {
            let gate_c = Arc::clone(&gate);
            let order = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                assert!(gate_c.admit(Timeout::Infinite));
                order.lock().unwrap().push(i);
                gate_c.release();
            }));
            // Queue each waiter before spawning the next one.
            wait_until(|| gate.waiters() == i + 1);
        }

        gate.release();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_timed_out_head_does_not_block_followers() {
        let gate = Arc::new(AdmissionGate::new());
        assert!(gate.try_admit());

        let impatient = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.admit(Timeout::Duration(Duration::from_millis(20))))
        };
        wait_until(|| gate.waiters() == 1);
        let patient = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.admit(Timeout::Infinite))
        };

        assert!(!impatient.join().unwrap());
        wait_until(|| gate.waiters() == 1);
        gate.release();
        assert!(patient.join().unwrap());
    }

    #[test]
    fn test_mutual_exclusion_under_contention() {
        let gate = Arc::new(AdmissionGate::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let inside = Arc::clone(&inside);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    assert!(gate.admit(Timeout::Infinite));
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    std::hint::spin_loop();
                    inside.fetch_sub(1, Ordering::SeqCst);
                    assert!(gate.release());
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(!gate.is_held());
    }
}
