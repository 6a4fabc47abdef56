//! Single-flight executor for resources that process one outstanding command
//! at a time and report completion out-of-band, from a thread the executor
//! does not control.
//!
//! - [`sync`]: admission gate and single-write result slot.
//! - [`executor`]: the [`Executor`], its pending-operation table and types.
//! - [`runtime`]: clock used for admission timestamps and the watchdog.

pub mod executor;
pub mod runtime;
pub mod sync;
mod trace;

pub use executor::types::{
    ExecError, ExecutorConfig, ExecutorError, ExecutorId, Failure, OK_STATUS, Operation,
    OperationError, OperationId, Outcome,
};
pub use executor::{Executor, ExecutorStats, FutureHandle};
pub use sync::Timeout;
pub use trace::init_tracing;
