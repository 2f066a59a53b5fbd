//! Error types for the benchmark driver and its harness.
//!
//! Every failure is typed. The driver decides through its
//! [`SignalFailurePolicy`](crate::config::SignalFailurePolicy) whether a
//! failed signal is counted or ends the run.

use thiserror::Error;

/// Result type alias for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors produced while setting up, running or reporting a benchmark.
///
/// # Design Notes
///
/// - Uses `thiserror` for automatic `Error` trait implementation
/// - OS failures keep the originating `std::io::Error` as their source
/// - All variants are `Send + Sync`
#[derive(Debug, Error)]
pub enum BenchError {
    /// The notification object could not be created.
    ///
    /// For an eventfd this is typically `EMFILE`/`ENFILE` (descriptor
    /// limits) or `ENOSYS` inside restrictive sandboxes.
    #[error("failed to create notifier: {0}")]
    Create(#[source] std::io::Error),

    /// A signal operation failed.
    ///
    /// Only surfaced when the failure policy is `Abort`; with `Ignore` the
    /// failure is counted in the report instead.
    #[error("signal {iteration} failed: {source}")]
    Signal {
        /// Zero-based index of the failing signal within the loop
        iteration: u64,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The process CPU-time clock could not be read.
    #[error("failed to read CPU clock: {0}")]
    Clock(#[source] std::io::Error),

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested facility does not exist on this platform.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// Any other I/O error, e.g. writing the CSV results file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the error came from the notification object itself.
    pub fn is_notifier_error(&self) -> bool {
        matches!(self, BenchError::Create(_) | BenchError::Signal { .. })
    }
}

static_assertions::assert_impl_all!(BenchError: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::{Error as IoError, ErrorKind};

    mod error_messages {
        use super::*;

        #[test]
        fn create() {
            let error = BenchError::Create(IoError::from_raw_os_error(libc::EMFILE));
            assert!(error.to_string().starts_with("failed to create notifier"));
        }

        #[test]
        fn signal_includes_iteration() {
            let error = BenchError::Signal {
                iteration: 41,
                source: IoError::new(ErrorKind::WouldBlock, "counter full"),
            };
            assert_eq!(error.to_string(), "signal 41 failed: counter full");
        }

        #[test]
        fn invalid_config() {
            let error = BenchError::InvalidConfig("iterations must be greater than 0".into());
            assert_eq!(
                error.to_string(),
                "invalid configuration: iterations must be greater than 0"
            );
        }

        #[test]
        fn unsupported() {
            let error = BenchError::Unsupported("eventfd");
            assert_eq!(error.to_string(), "unsupported on this platform: eventfd");
        }
    }

    mod error_conversion {
        use super::*;

        #[test]
        fn io_error_conversion() {
            let io_error = IoError::new(ErrorKind::PermissionDenied, "Access denied");
            let bench_error = BenchError::from(io_error);

            let BenchError::Io(ref e) = bench_error else {
                panic!("Expected Io error variant");
            };

            assert_eq!(e.kind(), ErrorKind::PermissionDenied);
            assert!(bench_error.to_string().contains("I/O error"));
        }

        #[test]
        fn question_mark_converts_io_errors() {
            fn fails() -> Result<()> {
                Err(IoError::new(ErrorKind::NotFound, "missing"))?;
                Ok(())
            }

            assert!(matches!(fails(), Err(BenchError::Io(_))));
        }
    }

    mod error_traits {
        use super::*;

        #[test]
        fn simple_errors_have_no_source() {
            let error = BenchError::InvalidConfig("x".into());
            assert!(error.source().is_none());
        }

        #[test]
        fn preserves_signal_source() {
            let error = BenchError::Signal {
                iteration: 0,
                source: IoError::new(ErrorKind::BrokenPipe, "closed"),
            };

            let source = error.source().expect("signal error keeps its source");
            let io_err = source.downcast_ref::<IoError>().unwrap();
            assert_eq!(io_err.kind(), ErrorKind::BrokenPipe);
        }

        #[test]
        fn notifier_error_classification() {
            assert!(BenchError::Create(IoError::other("x")).is_notifier_error());
            assert!(!BenchError::Clock(IoError::other("x")).is_notifier_error());
            assert!(!BenchError::Unsupported("eventfd").is_notifier_error());
        }
    }
}
