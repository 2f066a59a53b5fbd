//! # eventfd-bench: CPU cost of signalling an eventfd
//!
//! Measures how much processor time it takes to signal a Linux `eventfd`
//! many times in a tight loop. The measurement is the difference between
//! two readings of the process CPU-time clock, in `clock()` ticks
//! (microseconds), taken around the loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eventfd_bench::{BenchConfig, BenchDriver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // One million signals with 200 ms pauses on either side
//! let mut driver = BenchDriver::from_config(BenchConfig::long())?;
//! let report = driver.run()?;
//! println!("{}", report.ticks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Counting Signals
//!
//! The [`AtomicNotifier`] keeps a shared counter, so the number of signal
//! operations a run performed can be checked directly:
//!
//! ```rust
//! use eventfd_bench::{AtomicNotifier, BenchConfig, BenchDriver, ConfigBuilder, ProcessClock};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigBuilder::from_config(BenchConfig::quick())
//!     .iterations(10_000)
//!     .build()?;
//! let counter = AtomicNotifier::new();
//!
//! let mut driver = BenchDriver::new(config, counter.clone(), ProcessClock)?;
//! driver.run()?;
//! assert_eq!(counter.value(), 10_000);
//! # Ok(())
//! # }
//! ```
//!
//! ## Campaigns
//!
//! [`Campaign`] repeats the measurement with warm-up runs and writes one
//! CSV row per round; see the `eventfd-campaign` binary.
//!
//! ## Platform Support
//!
//! - **Linux**: eventfd and the atomic stand-in
//! - **Other Unix**: atomic stand-in only; requesting eventfd yields
//!   [`BenchError::Unsupported`]

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod logging; // Leveled stderr/file logging and macros

pub mod campaign;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod notifier;
pub mod stats;
pub mod system_info;

pub use campaign::{Campaign, CsvWriter, RoundResult};
pub use clock::{ProcessClock, TickSource, Ticks, TICKS_PER_SECOND};
pub use config::{
    BenchConfig, CampaignConfig, ConfigBuilder, LoggingConfig, SignalFailurePolicy,
};
pub use driver::{BenchDriver, BenchReport};
pub use error::{BenchError, Result};
pub use logging::{LogLevel, Logger};
pub use notifier::{
    detect_notifier, open_notifier, open_or_fallback, AtomicNotifier, Notifier, NotifierKind,
};
#[cfg(target_os = "linux")]
pub use notifier::{EventFd, EventFdFlags};
pub use stats::RunStats;
pub use system_info::SystemInfo;
