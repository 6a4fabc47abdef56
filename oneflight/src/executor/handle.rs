//! Caller-facing handle to a scheduled operation's outcome.

use std::fmt;
use std::sync::Arc;

use crate::executor::types::{ExecError, OperationId};
use crate::sync::Timeout;
use crate::sync::slot::ResultChannel;

/// Handle bound 1:1 to an operation's result slot.
///
/// Reads block the calling thread. Cancelling the handle interrupts only
/// this caller's wait; the operation keeps its permit until it completes.
pub struct FutureHandle<T> {
    id: OperationId,
    channel: Arc<ResultChannel<T>>,
}

impl<T> FutureHandle<T> {
    pub(crate) fn new(id: OperationId, channel: Arc<ResultChannel<T>>) -> Self {
        Self { id, channel }
    }

    /// Identity of the underlying operation.
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Blocks until the outcome is available and returns a copy of the value.
    ///
    /// # Errors
    ///
    /// The stored failure, [`ExecError::Timeout`] when `timeout` expires, or
    /// [`ExecError::Cancelled`] after [`FutureHandle::cancel`].
    pub fn read(&self, timeout: impl Into<Timeout>) -> Result<T, ExecError>
    where
        T: Clone,
    {
        self.channel.read(timeout.into())
    }

    /// Blocks until the outcome is available, discarding the value.
    ///
    /// # Errors
    ///
    /// Same as [`FutureHandle::read`].
    pub fn wait(&self, timeout: impl Into<Timeout>) -> Result<(), ExecError> {
        self.channel.wait(timeout.into())
    }

    /// Consumes the handle, moving the value out of the slot.
    ///
    /// # Errors
    ///
    /// Same as [`FutureHandle::read`], or [`ExecError::Consumed`] if another
    /// reader of the slot already took the outcome.
    pub fn into_result(self, timeout: impl Into<Timeout>) -> Result<T, ExecError> {
        self.channel.take(timeout.into())
    }

    /// Stops waiting for this operation. No effect once resolved.
    ///
    /// Returns `true` if the handle was cancelled by this call.
    pub fn cancel(&self) -> bool {
        self.channel.cancel_readers()
    }

    /// Whether the operation has reached a terminal outcome.
    ///
    /// Stays accurate after cancellation: a late completion is still recorded.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.channel.is_resolved()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.channel.is_cancelled()
    }
}

impl<T> fmt::Debug for FutureHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureHandle")
            .field("id", &self.id)
            .field("done", &self.is_done())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
