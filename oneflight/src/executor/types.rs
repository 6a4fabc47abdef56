//! Operation, identity, error and configuration types for the executor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::sync::Timeout;

/// Status value that [`crate::Executor::notify_completion`] treats as success
/// unless overridden in [`ExecutorConfig::ok_status`].
pub const OK_STATUS: i32 = 0;

/// Default bound on how long a queued operation waits for admission.
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default scan period of the stuck-operation watchdog.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_millis(100);

/// Identity of a scheduled operation.
///
/// Issued by the executor at schedule time and handed to the asynchronous
/// starter, which passes it on to whoever will eventually call notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct OperationId(u64);

impl OperationId {
    /// Creates an identifier from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<OperationId> for u64 {
    fn from(id: OperationId) -> Self {
        id.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Identifier of an executor instance, used to tell executors apart in logs.
///
/// Combines the process ID with a random nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutorId {
    pid: u32,
    nonce: u32,
}

impl ExecutorId {
    /// Generates a new identifier for the current process.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            pid: std::process::id(),
            nonce: rand::random(),
        }
    }
}

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:08x}", self.pid, self.nonce)
    }
}

type SyncCall<T> = Box<dyn FnOnce() -> Result<T, OperationError> + Send>;
type AsyncStart = Box<dyn FnOnce(OperationId) -> Result<(), OperationError> + Send>;

/// A unit of work submitted to the executor.
pub enum Operation<T> {
    /// Computes its value inline once admitted.
    Synchronous(SyncCall<T>),
    /// Starts external work once admitted. The work completes later through
    /// one of the executor's notify calls carrying the given [`OperationId`].
    ///
    /// Returning `Err` means the work was never started; the operation is
    /// failed immediately and the permit released.
    Asynchronous(AsyncStart),
}

impl<T> Operation<T> {
    /// Wraps a closure that computes the result inline.
    pub fn synchronous<F>(call: F) -> Self
    where
        F: FnOnce() -> Result<T, OperationError> + Send + 'static,
    {
        Self::Synchronous(Box::new(call))
    }

    /// Wraps a closure that starts external work for the given id.
    pub fn asynchronous<F>(start: F) -> Self
    where
        F: FnOnce(OperationId) -> Result<(), OperationError> + Send + 'static,
    {
        Self::Asynchronous(Box::new(start))
    }

    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Synchronous(_) => "sync",
            Self::Asynchronous(_) => "async",
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.kind()).finish()
    }
}

/// Domain failure raised by a synchronous call or reported through
/// [`crate::Executor::notify_failure`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error with a message.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal failure stored in an operation's result slot.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Operation(#[source] Arc<OperationError>),
    /// The controller reported a status other than the configured ok value.
    #[error("operation completed with status {0}")]
    Status(i32),
    /// A synchronous call or asynchronous starter panicked.
    #[error("operation panicked: {0}")]
    Panicked(String),
    /// The operation never got admitted within the configured bound.
    #[error("admission timed out after {0:?}")]
    AdmissionTimeout(Duration),
    /// The watchdog reclaimed the permit from an operation that never completed.
    #[error("operation abandoned after {0:?} in flight")]
    Abandoned(Duration),
    /// The executor could not start a background admission waiter.
    #[error("failed to spawn admission waiter: {0}")]
    Spawn(String),
}

impl Failure {
    /// Status code carried by a [`Failure::Status`].
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<OperationError> for Failure {
    fn from(e: OperationError) -> Self {
        Self::Operation(Arc::new(e))
    }
}

/// Terminal outcome of an operation.
pub type Outcome<T> = Result<T, Failure>;

/// Error observed by a caller waiting on an operation.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// The operation reached a failed outcome.
    #[error(transparent)]
    Failed(#[from] Failure),
    /// The caller's deadline expired. The operation itself is unaffected.
    #[error("timed out after {0:?} waiting for result")]
    Timeout(Duration),
    /// The caller's handle was cancelled before an outcome arrived.
    #[error("wait cancelled")]
    Cancelled,
    /// The outcome was already moved out by [`FutureHandle::into_result`](crate::FutureHandle::into_result).
    #[error("outcome already taken")]
    Consumed,
}

impl ExecError {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The stored failure, if this error carries one.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Error constructing an executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Failed to spawn the watchdog thread.
    #[error("failed to spawn watchdog thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Configuration for an [`crate::Executor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Prefix for the names of threads the executor spawns.
    pub name: String,
    /// How long a queued operation waits for the permit before failing with
    /// [`Failure::AdmissionTimeout`].
    pub admission_timeout: Timeout,
    /// Status value treated as success by `notify_completion`.
    pub ok_status: i32,
    /// Maximum time an asynchronous operation may stay in flight before the
    /// watchdog fails it with [`Failure::Abandoned`] and frees the permit.
    /// `None` disables the watchdog: a permit held by an operation that is
    /// never notified stays held.
    pub stuck_timeout: Option<Duration>,
    /// How often the watchdog scans for stuck operations.
    pub watchdog_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "oneflight".into(),
            admission_timeout: Timeout::Duration(DEFAULT_ADMISSION_TIMEOUT),
            ok_status: OK_STATUS,
            stuck_timeout: None,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_operation_id_display() {
        assert_eq!(OperationId::new(17).to_string(), "op-17");
        assert_eq!(u64::from(OperationId::new(3)), 3);
    }

    #[test]
    fn test_executor_ids_are_distinct() {
        let a = ExecutorId::generate();
        let b = ExecutorId::generate();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with(&format!("{}:", std::process::id())));
    }

    #[test]
    fn test_operation_error_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let err = OperationError::with_source("write failed", io);
        assert_eq!(err.to_string(), "write failed");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");

        let failure = Failure::from(err);
        assert_eq!(failure.to_string(), "operation failed: write failed");
        assert!(failure.source().is_some());
    }

    #[test]
    fn test_exec_error_is_transparent_over_failure() {
        let err = ExecError::from(Failure::Status(-5));
        assert_eq!(err.to_string(), "operation completed with status -5");
        assert_eq!(err.failure().and_then(Failure::status), Some(-5));
        assert!(!err.is_timeout());
        assert!(ExecError::Timeout(Duration::from_millis(1)).is_timeout());
    }

    #[test]
    fn test_operation_debug_names_variant() {
        let op = Operation::<u8>::synchronous(|| Ok(1));
        assert_eq!(format!("{op:?}"), "Operation(\"sync\")");
        let op = Operation::<u8>::asynchronous(|_| Ok(()));
        assert_eq!(op.kind(), "async");
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.ok_status, OK_STATUS);
        assert_eq!(
            config.admission_timeout,
            Timeout::Duration(DEFAULT_ADMISSION_TIMEOUT)
        );
        assert!(config.stuck_timeout.is_none());
    }
}
