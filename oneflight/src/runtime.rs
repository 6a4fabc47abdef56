//! Runtime utilities shared by the executor.
//!
//! - `clock`: typed monotonic timestamps used for diagnostics and the watchdog.

pub mod clock;
