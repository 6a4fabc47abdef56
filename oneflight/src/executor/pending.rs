//! Registry of admitted, not-yet-completed operations.
//!
//! An id is present iff its operation holds the admission permit and has not
//! completed. [`PendingOperationTable::complete`] removes the entry under the
//! table lock before writing the outcome, so of any number of racing or
//! duplicate completions exactly one observes the entry, writes the slot and
//! releases the permit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::executor::types::{OperationId, Outcome};
use crate::runtime::clock::{Duration, Micros, Timestamp};
use crate::sync::gate::AdmissionGate;
use crate::sync::slot::ResultChannel;
use crate::trace::trace;

/// Who finishes an admitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The executor, on the admitting thread, when the closure returns.
    Inline,
    /// An outside caller of notify.
    External,
}

struct PendingEntry<T> {
    channel: Arc<ResultChannel<T>>,
    admitted_at: Timestamp<Micros>,
    completion: Completion,
}

/// Result of a [`PendingOperationTable::complete`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// This call delivered the outcome and released the permit.
    Delivered {
        /// When the completed operation was admitted.
        admitted_at: Timestamp<Micros>,
    },
    /// No entry for the id: already completed, or never admitted.
    Absent,
}

impl Delivery {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Maps admitted operations to their result slots.
pub struct PendingOperationTable<T> {
    entries: Mutex<HashMap<OperationId, PendingEntry<T>>>,
    gate: Arc<AdmissionGate>,
}

impl<T> PendingOperationTable<T> {
    /// Creates an empty table releasing `gate` on every delivered completion.
    #[must_use]
    pub fn new(gate: Arc<AdmissionGate>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            gate,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OperationId, PendingEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an admitted operation. Must be called before its work starts.
    ///
    /// Returns `false` if `id` was already registered, leaving the existing
    /// entry in place.
    pub fn register(
        &self,
        id: OperationId,
        channel: Arc<ResultChannel<T>>,
        admitted_at: Timestamp<Micros>,
        completion: Completion,
    ) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(
            id,
            PendingEntry {
                channel,
                admitted_at,
                completion,
            },
        );
        true
    }

    /// Delivers `outcome` to `id`'s slot and releases the permit, once.
    pub fn complete(&self, id: OperationId, outcome: Outcome<T>) -> Delivery {
        // Lookup and removal are one step; the slot write and release happen
        // after the lock is dropped, by the single caller that removed it.
        let Some(entry) = self.lock().remove(&id) else {
            trace!(op = %id, "completion for absent entry");
            return Delivery::Absent;
        };
        entry.channel.write(outcome);
        self.gate.release();
        Delivery::Delivered {
            admitted_at: entry.admitted_at,
        }
    }

    #[must_use]
    pub fn contains(&self, id: OperationId) -> bool {
        self.lock().contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The operation currently holding the permit, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<OperationId> {
        self.lock().keys().min().copied()
    }

    /// Externally completed entries that have been in flight for at least
    /// `max_age` as of `now`, with their ages.
    ///
    /// Inline entries are never reported: their closure may still be running
    /// and the executor completes them itself when it returns.
    #[must_use]
    pub fn older_than(
        &self,
        now: Timestamp<Micros>,
        max_age: Duration<Micros>,
    ) -> Vec<(OperationId, Duration<Micros>)> {
        self.lock()
            .iter()
            .filter(|(_, entry)| entry.completion == Completion::External)
            .filter_map(|(id, entry)| {
                let age = now.saturating_since(entry.admitted_at);
                (age >= max_age).then_some((*id, age))
            })
            .collect()
    }
}
