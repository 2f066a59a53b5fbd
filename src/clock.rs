//! Process CPU-time clock.
//!
//! The workload reports elapsed processor time in the units of C's
//! `clock()`. glibc implements `clock()` on top of
//! `CLOCK_PROCESS_CPUTIME_ID` with `CLOCKS_PER_SEC` fixed at one million,
//! and [`ProcessClock`] does the same, so the numbers match what the C
//! program printed.

use std::fmt;
use std::io;
use std::mem::MaybeUninit;
use std::time::Duration;

use crate::error::{BenchError, Result};

/// Ticks per second of the process clock (`CLOCKS_PER_SEC`).
pub const TICKS_PER_SECOND: u64 = 1_000_000;

const NANOS_PER_TICK: u64 = 1_000_000_000 / TICKS_PER_SECOND;

/// A reading of, or a difference between readings of, the CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u64);

impl Ticks {
    /// Zero ticks.
    pub const ZERO: Ticks = Ticks(0);

    /// Wrap a raw tick count.
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw tick count.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Ticks elapsed between `start` and `self`.
    ///
    /// Saturates at zero: a per-process CPU clock cannot run backwards, but
    /// a reported value must never be negative even if a platform clock
    /// misbehaves.
    pub fn elapsed_since(self, start: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(start.0))
    }

    /// Convert to wall-style duration.
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(self.0.saturating_mul(1_000_000 / TICKS_PER_SECOND))
    }

    /// Convert a duration into ticks, truncating sub-tick remainders.
    pub fn from_duration(duration: Duration) -> Self {
        let ticks = duration.as_nanos() / u128::from(NANOS_PER_TICK);
        Self(u64::try_from(ticks).unwrap_or(u64::MAX))
    }

    fn from_clock_parts(secs: i64, nanos: i64) -> Self {
        let secs = u64::try_from(secs).unwrap_or(0);
        let nanos = u64::try_from(nanos).unwrap_or(0);
        Self(
            secs.saturating_mul(TICKS_PER_SECOND)
                .saturating_add(nanos / NANOS_PER_TICK),
        )
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Ticks> for u64 {
    fn from(ticks: Ticks) -> u64 {
        ticks.0
    }
}

/// Anything that can be read as a monotonically non-decreasing tick count.
pub trait TickSource {
    /// Current reading.
    fn now(&self) -> Result<Ticks>;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Result<Ticks> {
        (**self).now()
    }
}

/// CPU time consumed by the whole process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessClock;

impl TickSource for ProcessClock {
    fn now(&self) -> Result<Ticks> {
        let mut ts = MaybeUninit::<libc::timespec>::uninit();

        let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, ts.as_mut_ptr()) };
        if rc != 0 {
            return Err(BenchError::Clock(io::Error::last_os_error()));
        }

        // SAFETY: clock_gettime returned 0, so it filled in `ts`.
        let ts = unsafe { ts.assume_init() };
        Ok(Ticks::from_clock_parts(ts.tv_sec as i64, ts.tv_nsec as i64))
    }
}
