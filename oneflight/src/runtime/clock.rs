//! Minimal time units, strongly-typed timestamps and the executor clock.
//!
//! Timestamps are diagnostics only: admission ages, completion latency and
//! the stuck-operation watchdog. Nothing here gates mutual exclusion.

use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker trait for a time unit.
pub trait TimeUnit {
    /// Number of nanoseconds in one unit.
    const NANOS: u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Micros {}
impl TimeUnit for Micros {
    const NANOS: u64 = 1_000;
}

/// Strongly-typed duration in a given unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Duration<U: TimeUnit>(pub u64, PhantomData<U>);

/// Strongly-typed timestamp in a given unit, relative to the clock's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Timestamp<U: TimeUnit>(pub u64, PhantomData<U>);

impl<U: TimeUnit> Duration<U> {
    /// Create a new duration.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Return the raw value.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Converts a std duration, truncating to whole units.
    #[inline]
    pub fn from_std(d: std::time::Duration) -> Self {
        Self::new((d.as_nanos() / u128::from(U::NANOS)) as u64)
    }

    /// Converts to a std duration.
    #[inline]
    pub fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.0.saturating_mul(U::NANOS))
    }
}

impl<U: TimeUnit> Timestamp<U> {
    /// Create a new timestamp.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Span from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub const fn saturating_since(self, earlier: Self) -> Duration<U> {
        Duration::new(self.0.saturating_sub(earlier.0))
    }
}

/// Source of monotonic microsecond timestamps.
pub trait Clock: Send + Sync {
    /// Current time relative to the clock's anchor.
    fn now(&self) -> Timestamp<Micros>;
}

/// TSC-backed monotonic clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: minstant::Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: minstant::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Timestamp<Micros> {
        Timestamp::new(self.anchor.elapsed().as_micros() as u64)
    }
}

/// Clock advanced by hand. Used to drive the watchdog deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&self, d: std::time::Duration) {
        let step = Duration::<Micros>::from_std(d).as_u64();
        self.now_us.fetch_add(step, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp<Micros> {
        Timestamp::new(self.now_us.load(Ordering::Acquire))
    }
}
