//! Process-local stand-in for the kernel notification object.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Notifier, MAX_COUNTER};

/// Atomic counter that follows eventfd's add semantics.
///
/// Cloning yields another handle to the same counter, so a test can keep
/// one handle while the driver owns the other and then check that exactly
/// the expected amount was added.
///
/// Like eventfd, the counter never exceeds [`MAX_COUNTER`]: an add that
/// would overflow it fails with `WouldBlock` and leaves the counter
/// unchanged. `u64::MAX` is rejected with `InvalidInput`.
#[derive(Debug, Clone, Default)]
pub struct AtomicNotifier {
    counter: Arc<AtomicU64>,
}

impl AtomicNotifier {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter starting at `initial` (clamped to [`MAX_COUNTER`]).
    pub fn with_initial(initial: u64) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(initial.min(MAX_COUNTER))),
        }
    }

    /// Current counter value.
    pub fn value(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Read and reset the counter, like a read on an eventfd.
    pub fn take(&self) -> u64 {
        self.counter.swap(0, Ordering::AcqRel)
    }
}

impl Notifier for AtomicNotifier {
    #[inline]
    fn signal(&mut self, value: u64) -> io::Result<()> {
        if value == u64::MAX {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }

        self.counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current
                    .checked_add(value)
                    .filter(|&next| next <= MAX_COUNTER)
            })
            .map(|_| ())
            .map_err(|_| io::Error::from(io::ErrorKind::WouldBlock))
    }

    fn name(&self) -> &'static str {
        "atomic"
    }
}
