//! Notification objects the benchmark signals.
//!
//! The benchmark only ever exercises the "add to counter" half of a
//! notification primitive. This module puts that operation behind the
//! [`Notifier`] trait so the timed loop can run against:
//!
//! - **[`EventFd`]**: the kernel eventfd object (Linux only), the thing
//!   actually being measured
//! - **[`AtomicNotifier`]**: a process-local atomic counter with the same
//!   saturation rule, used where eventfd is unavailable and as an
//!   instrumented counter in tests

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::error::{BenchError, Result};
use crate::{log_debug, log_warn};

pub mod atomic;
#[cfg(target_os = "linux")]
pub mod eventfd;

pub use atomic::AtomicNotifier;
#[cfg(target_os = "linux")]
pub use eventfd::{EventFd, EventFdFlags};

/// Largest value an eventfd counter can hold.
///
/// A write that would push the counter past this blocks (or fails with
/// `EAGAIN` in non-blocking mode). `u64::MAX` itself is rejected with
/// `EINVAL`.
pub const MAX_COUNTER: u64 = u64::MAX - 1;

/// An object whose internal counter can be incremented.
///
/// Implementations must perform exactly one underlying operation per call
/// to [`signal`](Notifier::signal): the driver relies on this to guarantee
/// that `iterations` calls mean `iterations` operations.
pub trait Notifier {
    /// Add `value` to the notifier's counter.
    ///
    /// # Errors
    ///
    /// Returns the OS error of the underlying operation. The driver wraps
    /// it in [`BenchError::Signal`] together with the iteration index.
    fn signal(&mut self, value: u64) -> io::Result<()>;

    /// Short name used in logs and reports, e.g. `"eventfd"`.
    fn name(&self) -> &'static str;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    #[inline]
    fn signal(&mut self, value: u64) -> io::Result<()> {
        (**self).signal(value)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    #[inline]
    fn signal(&mut self, value: u64) -> io::Result<()> {
        (**self).signal(value)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Selects which notifier implementation a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifierKind {
    /// Kernel eventfd (Linux only)
    #[default]
    EventFd,
    /// In-process atomic counter
    Atomic,
}

impl NotifierKind {
    /// Name matching [`Notifier::name`] of the created notifier.
    pub fn name(&self) -> &'static str {
        match self {
            NotifierKind::EventFd => "eventfd",
            NotifierKind::Atomic => "atomic",
        }
    }

    /// Whether this kind can be created on the current platform.
    pub fn is_supported(&self) -> bool {
        match self {
            NotifierKind::EventFd => cfg!(target_os = "linux"),
            NotifierKind::Atomic => true,
        }
    }
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NotifierKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "eventfd" | "efd" => Ok(NotifierKind::EventFd),
            "atomic" => Ok(NotifierKind::Atomic),
            other => Err(BenchError::InvalidConfig(format!(
                "unknown notifier '{other}', expected 'eventfd' or 'atomic'"
            ))),
        }
    }
}

/// Create a notifier of the requested kind.
///
/// # Errors
///
/// - [`BenchError::Create`] if the kernel refuses to create the eventfd
/// - [`BenchError::Unsupported`] for `EventFd` on non-Linux platforms
pub fn open_notifier(kind: NotifierKind) -> Result<Box<dyn Notifier>> {
    match kind {
        #[cfg(target_os = "linux")]
        NotifierKind::EventFd => {
            let efd = EventFd::new()?;
            log_debug!("notifier", "created eventfd on fd {}", efd.fd());
            Ok(Box::new(efd))
        }
        #[cfg(not(target_os = "linux"))]
        NotifierKind::EventFd => Err(BenchError::Unsupported("eventfd")),
        NotifierKind::Atomic => Ok(Box::new(AtomicNotifier::new())),
    }
}

/// Create a notifier of the requested kind, substituting an
/// [`AtomicNotifier`] if it cannot be created.
///
/// A warning names the notifier that was substituted.
pub fn open_or_fallback(kind: NotifierKind) -> Box<dyn Notifier> {
    match open_notifier(kind) {
        Ok(notifier) => notifier,
        Err(e) => {
            log_warn!(
                "notifier",
                "{} unavailable ({}), falling back to atomic counter",
                kind,
                e
            );
            Box::new(AtomicNotifier::new())
        }
    }
}

/// Pick the best notifier for this system: eventfd where available,
/// the atomic counter otherwise.
pub fn detect_notifier() -> Box<dyn Notifier> {
    open_or_fallback(NotifierKind::EventFd)
}
