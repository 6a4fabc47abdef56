//! Single-flight executor: serializes operations against a resource that
//! accepts one outstanding command at a time.
//!
//! # Architecture
//!
//! ```text
//!  caller ──schedule──► try_admit ──ok──► register ──► start work
//!                          │                               │
//!                          └─busy─► admission waiter ──────┘
//!                                   (admit with timeout)
//!
//!  controller ──notify*(id)──► PendingOperationTable::complete
//!                                  │ remove entry (once)
//!                                  ├─► write ResultChannel ──► FutureHandle
//!                                  └─► release AdmissionGate ──► next waiter
//! ```
//!
//! - **Synchronous** operations compute inline on the admitting thread and
//!   complete through the same table path as external notifications.
//! - **Asynchronous** operations start external work and return. The
//!   controller later calls exactly one of [`Executor::notify_success`],
//!   [`Executor::notify_failure`] or [`Executor::notify_completion`] with
//!   the operation's id, from any thread. Extra calls are ignored.
//!
//! ## Timeouts and recovery
//!
//! A caller timeout ([`Executor::execute_timeout`],
//! [`Executor::get_result_timeout`]) cancels only that caller's wait. The
//! permit and the table entry stay put, because the controller may still be
//! working on the command. If the controller never answers, the permit is
//! held until [`ExecutorConfig::stuck_timeout`] lets the watchdog fail the
//! operation with [`Failure::Abandoned`], or until
//! [`Executor::reclaim_stuck`] is called by hand.
//!
//! # Example
//!
//! ```
//! use oneflight::{Executor, ExecutorConfig, Operation};
//!
//! let executor = Executor::<String>::new(ExecutorConfig::default())?;
//!
//! let value = executor.execute(Operation::synchronous(|| Ok("R".to_string())))?;
//! assert_eq!(value, "R");
//!
//! let handle = executor.schedule(Operation::asynchronous(|_id| Ok(())));
//! executor.notify_success(handle.id(), "R2".to_string());
//! assert_eq!(executor.get_result(&handle)?, "R2");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod handle;
pub mod pending;
mod stats;
pub mod types;
mod watchdog;

pub use handle::FutureHandle;
pub use stats::ExecutorStats;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use minstant::Instant;

use crate::runtime::clock::{self, Clock, MonotonicClock};
use crate::sync::Timeout;
use crate::sync::gate::AdmissionGate;
use crate::sync::slot::ResultChannel;
use crate::trace::{debug, error, info, trace, warn};

use pending::{Completion, Delivery, PendingOperationTable};
use stats::Counters;
use types::{
    ExecError, ExecutorConfig, ExecutorError, ExecutorId, Failure, Operation, OperationError,
    OperationId, Outcome,
};

/// Handle to a single-flight executor.
///
/// Cloning is cheap and every clone drives the same gate and table, so an
/// executor can be handed to callers and to the controller that notifies it.
pub struct Executor<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    id: ExecutorId,
    config: ExecutorConfig,
    gate: Arc<AdmissionGate>,
    pending: PendingOperationTable<T>,
    clock: Arc<dyn Clock>,
    next_op: AtomicU64,
    counters: Counters,
    /// Shutdown flag shared with the watchdog thread.
    shutdown: Arc<AtomicBool>,
    watchdog: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Executor<T> {
    /// Creates an executor using the process monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the watchdog thread cannot be spawned.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Creates an executor reading admission timestamps from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watchdog thread cannot be spawned.
    pub fn with_clock(config: ExecutorConfig, clock: Arc<dyn Clock>) -> Result<Self, ExecutorError> {
        let gate = Arc::new(AdmissionGate::new());
        let inner = Arc::new(Inner {
            id: ExecutorId::generate(),
            pending: PendingOperationTable::new(Arc::clone(&gate)),
            gate,
            clock,
            next_op: AtomicU64::new(1),
            counters: Counters::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            watchdog: Mutex::new(None),
            config,
        });

        info!(
            executor = %inner.id,
            name = %inner.config.name,
            admission_timeout = ?inner.config.admission_timeout,
            stuck_timeout = ?inner.config.stuck_timeout,
            "executor starting"
        );

        if let Some(stuck) = inner.config.stuck_timeout {
            let handle = watchdog::spawn(&inner, stuck).map_err(|e| {
                error!(executor = %inner.id, error = %e, "failed to spawn watchdog thread");
                ExecutorError::Spawn(e)
            })?;
            *inner.watchdog.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }

        Ok(Self { inner })
    }

    /// Submits `op` and returns a handle to its eventual outcome.
    ///
    /// If the permit is free it is claimed on the calling thread and the work
    /// starts before this returns (a synchronous operation runs to completion
    /// here). Otherwise a background thread waits up to
    /// [`ExecutorConfig::admission_timeout`] for the permit and then starts
    /// the work.
    pub fn schedule(&self, op: Operation<T>) -> FutureHandle<T> {
        let inner = &self.inner;
        let id = inner.next_id();
        let channel = Arc::new(ResultChannel::new());
        let handle = FutureHandle::new(id, Arc::clone(&channel));

        if inner.gate.try_admit() {
            trace!(op = %id, kind = op.kind(), "admitted immediately");
            inner.start(id, op, channel);
            return handle;
        }

        debug!(
            op = %id,
            kind = op.kind(),
            queued = inner.gate.waiters(),
            "permit busy, queueing for admission"
        );
        let waiter = Arc::clone(inner);
        let waiter_channel = Arc::clone(&channel);
        let spawned = thread::Builder::new()
            .name(format!("{}-admit-{}", inner.config.name, id.get()))
            .spawn(move || waiter.admit_and_start(id, op, waiter_channel));
        if let Err(e) = spawned {
            error!(op = %id, error = %e, "failed to spawn admission waiter");
            channel.write(Err(Failure::Spawn(e.to_string())));
        }
        handle
    }

    /// Schedules `op` and blocks until its outcome is available.
    ///
    /// # Errors
    ///
    /// The operation's failure, wrapped in [`ExecError::Failed`].
    pub fn execute(&self, op: Operation<T>) -> Result<T, ExecError> {
        self.schedule(op).into_result(Timeout::Infinite)
    }

    /// Schedules `op` and blocks for at most `timeout`.
    ///
    /// On timeout the wait is cancelled, but the operation keeps its permit
    /// and table entry: a late completion is still delivered and releases the
    /// permit as usual.
    ///
    /// # Errors
    ///
    /// The operation's failure, or [`ExecError::Timeout`].
    pub fn execute_timeout(&self, op: Operation<T>, timeout: Duration) -> Result<T, ExecError> {
        let handle = self.schedule(op);
        match handle.wait(timeout) {
            Ok(()) => handle.into_result(Timeout::Infinite),
            Err(ExecError::Timeout(d)) => {
                handle.cancel();
                debug!(op = %handle.id(), timeout_ms = d.as_millis() as u64, "execute timed out");
                Err(ExecError::Timeout(d))
            }
            Err(e) => Err(e),
        }
    }

    /// Completes `id` successfully with `value`.
    ///
    /// Returns `true` if this call delivered the outcome; `false` if the
    /// operation already completed or is unknown.
    pub fn notify_success(&self, id: OperationId, value: T) -> bool {
        self.inner.complete(id, Ok(value))
    }

    /// Completes `id` successfully with `T::default()`.
    pub fn notify_done(&self, id: OperationId) -> bool
    where
        T: Default,
    {
        self.notify_success(id, T::default())
    }

    /// Completes `id` with a domain failure.
    pub fn notify_failure(&self, id: OperationId, error: OperationError) -> bool {
        self.inner.complete(id, Err(error.into()))
    }

    /// Completes `id` from a controller status code.
    ///
    /// [`ExecutorConfig::ok_status`] maps to success with `T::default()`;
    /// any other value fails with [`Failure::Status`].
    pub fn notify_completion(&self, id: OperationId, status: i32) -> bool
    where
        T: Default,
    {
        self.notify_completion_with(id, status, T::default())
    }

    /// Like [`Executor::notify_completion`], with the value to deliver on success.
    pub fn notify_completion_with(&self, id: OperationId, status: i32, value: T) -> bool {
        let outcome = if status == self.inner.config.ok_status {
            Ok(value)
        } else {
            Err(Failure::Status(status))
        };
        self.inner.complete(id, outcome)
    }

    /// Blocks until every handle has an outcome.
    ///
    /// # Errors
    ///
    /// The first failure in iteration order, once all handles resolved.
    pub fn wait_for<'a, I>(&self, handles: I) -> Result<(), ExecError>
    where
        I: IntoIterator<Item = &'a FutureHandle<T>>,
        T: 'a,
    {
        wait_all(handles, Timeout::Infinite)
    }

    /// Like [`Executor::wait_for`], bounded by a single deadline for all handles.
    ///
    /// # Errors
    ///
    /// [`ExecError::Timeout`] as soon as the deadline passes with a handle
    /// still pending; otherwise the first failure in iteration order.
    pub fn wait_for_timeout<'a, I>(&self, handles: I, timeout: Duration) -> Result<(), ExecError>
    where
        I: IntoIterator<Item = &'a FutureHandle<T>>,
        T: 'a,
    {
        wait_all(handles, Timeout::Duration(timeout))
    }

    /// Blocks until `handle` resolves and returns its value.
    ///
    /// # Errors
    ///
    /// The stored failure, or [`ExecError::Cancelled`] for a cancelled handle.
    pub fn get_result(&self, handle: &FutureHandle<T>) -> Result<T, ExecError>
    where
        T: Clone,
    {
        handle.read(Timeout::Infinite)
    }

    /// Blocks for at most `timeout`. A timeout cancels `handle`.
    ///
    /// # Errors
    ///
    /// The stored failure, or [`ExecError::Timeout`].
    pub fn get_result_timeout(
        &self,
        handle: &FutureHandle<T>,
        timeout: Duration,
    ) -> Result<T, ExecError>
    where
        T: Clone,
    {
        match handle.read(timeout) {
            Err(ExecError::Timeout(d)) => {
                handle.cancel();
                debug!(op = %handle.id(), timeout_ms = d.as_millis() as u64, "result wait timed out");
                Err(ExecError::Timeout(d))
            }
            other => other,
        }
    }

    /// Fails every asynchronous operation in flight for at least `max_age`
    /// with [`Failure::Abandoned`], releasing its permit.
    ///
    /// Synchronous operations are left alone: they hold the permit until
    /// their closure returns.
    ///
    /// Returns the number of operations reclaimed.
    pub fn reclaim_stuck(&self, max_age: Duration) -> usize {
        self.inner.reclaim_stuck(max_age)
    }

    /// Stops the watchdog thread, if any, and waits for it to exit.
    ///
    /// Scheduling and notification keep working afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        let handle = self
            .inner
            .watchdog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            debug!("waiting for watchdog thread to exit");
            handle.thread().unpark();
            let _ = handle.join();
        }
        info!(executor = %self.inner.id, "executor shut down");
    }
}

impl<T> Executor<T> {
    #[must_use]
    pub fn id(&self) -> ExecutorId {
        self.inner.id
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    /// The operation currently holding the permit, if it is tracked.
    #[must_use]
    pub fn in_flight(&self) -> Option<OperationId> {
        self.inner.pending.in_flight()
    }

    /// Whether `id` is admitted and not yet completed.
    #[must_use]
    pub fn is_pending(&self, id: OperationId) -> bool {
        self.inner.pending.contains(id)
    }

    /// Number of admitted operations awaiting completion (0 or 1).
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.pending.len()
    }

    /// Number of operations blocked waiting for admission.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.gate.waiters()
    }

    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.inner.counters.snapshot()
    }
}

impl<T> fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("id", &self.inner.id)
            .field("name", &self.inner.config.name)
            .field("in_flight", &self.in_flight())
            .field("queued", &self.queued())
            .finish()
    }
}

impl<T> Inner<T> {
    fn next_id(&self) -> OperationId {
        OperationId::new(self.next_op.fetch_add(1, Ordering::Relaxed))
    }

    /// Runs on the background waiter thread of an operation that found the
    /// permit busy.
    fn admit_and_start(&self, id: OperationId, op: Operation<T>, channel: Arc<ResultChannel<T>>) {
        let timeout = self.config.admission_timeout;
        if !self.gate.admit(timeout) {
            self.counters.admission_timeout();
            warn!(
                op = %id,
                timeout_ms = timeout.as_duration().as_millis() as u64,
                "admission timed out"
            );
            channel.write(Err(Failure::AdmissionTimeout(timeout.as_duration())));
            return;
        }
        self.start(id, op, channel);
    }

    /// Starts an admitted operation. The caller holds the permit.
    fn start(&self, id: OperationId, op: Operation<T>, channel: Arc<ResultChannel<T>>) {
        self.counters.admitted();
        let completion = match op {
            Operation::Synchronous(_) => Completion::Inline,
            Operation::Asynchronous(_) => Completion::External,
        };
        // Registered before the work starts so a completion from any thread
        // finds the entry.
        self.pending.register(id, channel, self.clock.now(), completion);

        match op {
            Operation::Synchronous(call) => {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(call)) {
                    Ok(result) => result.map_err(Failure::from),
                    Err(payload) => {
                        warn!(op = %id, "synchronous operation panicked");
                        Err(Failure::Panicked(panic_message(payload.as_ref())))
                    }
                };
                self.complete(id, outcome);
            }
            Operation::Asynchronous(begin) => {
                match panic::catch_unwind(AssertUnwindSafe(|| begin(id))) {
                    Ok(Ok(())) => {
                        trace!(op = %id, "asynchronous work started");
                    }
                    Ok(Err(e)) => {
                        warn!(op = %id, error = %e, "asynchronous start failed");
                        self.complete(id, Err(e.into()));
                    }
                    Err(payload) => {
                        warn!(op = %id, "asynchronous starter panicked");
                        self.complete(id, Err(Failure::Panicked(panic_message(payload.as_ref()))));
                    }
                }
            }
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn complete(&self, id: OperationId, outcome: Outcome<T>) -> bool {
        let failed = outcome.is_err();
        match self.pending.complete(id, outcome) {
            Delivery::Delivered { admitted_at } => {
                self.counters.completed();
                debug!(
                    op = %id,
                    failed,
                    held_us = self.clock.now().saturating_since(admitted_at).as_u64(),
                    "operation completed"
                );
                true
            }
            Delivery::Absent => {
                self.counters.ignored();
                debug!(op = %id, "ignoring completion for absent operation");
                false
            }
        }
    }

    fn reclaim_stuck(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut reclaimed = 0;
        for (id, age) in self
            .pending
            .older_than(now, clock::Duration::from_std(max_age))
        {
            let age = age.to_std();
            if self
                .pending
                .complete(id, Err(Failure::Abandoned(age)))
                .is_delivered()
            {
                self.counters.abandoned();
                reclaimed += 1;
                warn!(
                    op = %id,
                    age_ms = age.as_millis() as u64,
                    "abandoned stuck operation and released permit"
                );
            }
        }
        reclaimed
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let watchdog = self
            .watchdog
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        // Not joined: the last reference may be dropped on the watchdog itself.
        if let Some(handle) = watchdog.as_ref() {
            handle.thread().unpark();
        }
    }
}

fn wait_all<'a, T: 'a>(
    handles: impl IntoIterator<Item = &'a FutureHandle<T>>,
    timeout: Timeout,
) -> Result<(), ExecError> {
    let deadline = timeout.deadline();
    let mut first_error = None;
    for handle in handles {
        let remaining = match deadline {
            None => Timeout::Infinite,
            Some(dl) => Timeout::Duration(
                dl.checked_duration_since(Instant::now())
                    .unwrap_or(Duration::ZERO),
            ),
        };
        match handle.wait(remaining) {
            Ok(()) => {}
            Err(ExecError::Timeout(_)) => return Err(ExecError::Timeout(timeout.as_duration())),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::clock::ManualClock;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    fn executor<T: Send + 'static>() -> Executor<T> {
        Executor::new(ExecutorConfig::default()).unwrap()
    }

    #[test]
    fn test_operation_ids_are_unique_and_increasing() {
        let executor = executor::<u32>();
        let a = executor.schedule(Operation::synchronous(|| Ok(1)));
        let b = executor.schedule(Operation::synchronous(|| Ok(2)));
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_synchronous_error_is_stored_and_permit_released() {
        let executor = executor::<u32>();
        let err = executor
            .execute(Operation::synchronous(|| Err(OperationError::new("nope"))))
            .unwrap_err();
        assert!(matches!(err, ExecError::Failed(Failure::Operation(ref e)) if e.message() == "nope"));
        assert!(!executor.inner.gate.is_held());
        assert_eq!(executor.pending_len(), 0);
    }

    #[test]
    fn test_synchronous_panic_is_stored_and_permit_released() {
        let executor = executor::<u32>();
        let err = executor
            .execute(Operation::synchronous(|| panic!("kaboom")))
            .unwrap_err();
        assert!(matches!(err, ExecError::Failed(Failure::Panicked(ref m)) if m == "kaboom"));
        assert!(!executor.inner.gate.is_held());
        assert_eq!(executor.execute(Operation::synchronous(|| Ok(3))).unwrap(), 3);
    }

    #[test]
    fn test_asynchronous_start_error_fails_immediately() {
        let executor = executor::<u32>();
        let handle = executor.schedule(Operation::asynchronous(|_| {
            Err(OperationError::new("controller offline"))
        }));
        assert!(handle.is_done());
        assert!(!executor.inner.gate.is_held());
        assert!(matches!(
            executor.get_result(&handle),
            Err(ExecError::Failed(Failure::Operation(_)))
        ));
    }

    #[test]
    fn test_asynchronous_starter_panic_releases_permit() {
        let executor = executor::<u32>();
        let handle = executor.schedule(Operation::asynchronous(|_| panic!("bad starter")));
        assert!(matches!(
            executor.get_result(&handle),
            Err(ExecError::Failed(Failure::Panicked(_)))
        ));
        assert!(!executor.inner.gate.is_held());
    }

    #[test]
    fn test_notify_completion_uses_configured_ok_status() {
        let config = ExecutorConfig {
            ok_status: 200,
            ..ExecutorConfig::default()
        };
        let executor = Executor::<u32>::new(config).unwrap();

        let ok = executor.schedule(Operation::asynchronous(|_| Ok(())));
        assert!(executor.notify_completion_with(ok.id(), 200, 9));
        assert_eq!(executor.get_result(&ok).unwrap(), 9);

        let bad = executor.schedule(Operation::asynchronous(|_| Ok(())));
        assert!(executor.notify_completion(bad.id(), 0));
        let err = executor.get_result(&bad).unwrap_err();
        assert_eq!(err.failure().and_then(Failure::status), Some(0));
    }

    #[test]
    fn test_reclaim_stuck_uses_injected_clock() {
        let clock = Arc::new(ManualClock::new());
        let executor =
            Executor::<u32>::with_clock(ExecutorConfig::default(), clock.clone()).unwrap();

        let handle = executor.schedule(Operation::asynchronous(|_| Ok(())));
        assert_eq!(executor.reclaim_stuck(Duration::from_millis(50)), 0);
        assert!(executor.is_pending(handle.id()));

        clock.advance(Duration::from_millis(80));
        assert_eq!(executor.reclaim_stuck(Duration::from_millis(50)), 1);
        assert!(!executor.is_pending(handle.id()));
        assert!(matches!(
            executor.get_result(&handle),
            Err(ExecError::Failed(Failure::Abandoned(age))) if age == Duration::from_millis(80)
        ));

        // The real completion arriving late is ignored.
        assert!(!executor.notify_success(handle.id(), 1));
        assert_eq!(executor.stats().abandoned, 1);
    }

    #[test]
    fn test_reclaim_stuck_leaves_running_synchronous_operation() {
        let clock = Arc::new(ManualClock::new());
        let executor =
            Executor::<u32>::with_clock(ExecutorConfig::default(), clock.clone()).unwrap();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let counted = |value: u32, release: Option<mpsc::Receiver<()>>| {
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            Operation::synchronous(move || {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                if let Some(release) = release {
                    let _ = release.recv();
                }
                inside.fetch_sub(1, Ordering::SeqCst);
                Ok(value)
            })
        };

        let (release_tx, release_rx) = mpsc::channel();
        let first = {
            let executor = executor.clone();
            let op = counted(1, Some(release_rx));
            thread::spawn(move || executor.execute(op))
        };
        while inside.load(Ordering::SeqCst) == 0 {
            thread::yield_now();
        }
        let second = executor.schedule(counted(2, None));
        while executor.queued() == 0 {
            thread::yield_now();
        }

        // Long past any bound, yet the running closure keeps its permit.
        clock.advance(Duration::from_secs(1));
        assert_eq!(executor.reclaim_stuck(Duration::from_millis(10)), 0);
        assert!(executor.inner.gate.is_held());
        assert!(!second.is_done());

        release_tx.send(()).unwrap();
        assert_eq!(first.join().unwrap().unwrap(), 1);
        assert_eq!(executor.get_result(&second).unwrap(), 2);
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(executor.stats().abandoned, 0);
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_debug_shows_state() {
        let executor = executor::<u32>();
        let handle = executor.schedule(Operation::asynchronous(|_| Ok(())));
        let text = format!("{executor:?}");
        assert!(text.contains("in_flight: Some("));
        executor.notify_done(handle.id());
    }
}
