//! The benchmark driver.
//!
//! A run is strictly linear:
//!
//! 1. sleep for the settle pause
//! 2. read the CPU clock
//! 3. signal the notifier `iterations` times
//! 4. read the CPU clock again
//! 5. hand the [`BenchReport`] to the caller, which prints its `ticks`
//! 6. sleep for the cool-down pause
//!
//! [`BenchDriver::run_and_report`] exposes step 5 so the measurement line
//! is emitted before the cool-down starts.

use std::thread;
use std::time::{Duration, Instant};

use crate::clock::{ProcessClock, TickSource, Ticks};
use crate::config::{BenchConfig, SignalFailurePolicy};
use crate::error::{BenchError, Result};
use crate::logging::{self, LogEntry, LogLevel};
use crate::notifier::{self, Notifier};
use crate::{log_debug, log_warn};

/// Outcome of one timed loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchReport {
    /// Iterations requested
    pub iterations: u64,
    /// Signal calls made (equals `iterations` unless aborted)
    pub signals: u64,
    /// Signal calls that returned an error
    pub failures: u64,
    /// CPU ticks spent in the loop
    pub ticks: Ticks,
    /// Name of the notifier signalled
    pub notifier: &'static str,
}

impl BenchReport {
    /// Average CPU nanoseconds per signal.
    pub fn nanos_per_signal(&self) -> f64 {
        if self.signals == 0 {
            return 0.0;
        }
        self.ticks.as_duration().as_nanos() as f64 / self.signals as f64
    }

    /// Whether every signal succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }

    /// The single line the workload prints on stdout.
    pub fn output_line(&self) -> String {
        self.ticks.to_string()
    }
}

/// Runs the signal loop against a notifier, timed by a tick source.
pub struct BenchDriver<N, C = ProcessClock> {
    config: BenchConfig,
    notifier: N,
    clock: C,
}

impl BenchDriver<Box<dyn Notifier>, ProcessClock> {
    /// Build a driver for `config`, creating the configured notifier and
    /// timing it with the process CPU clock.
    ///
    /// # Errors
    ///
    /// Returns the creation error of the notifier as-is. To fall back to the
    /// atomic counter instead, use [`notifier::open_or_fallback`] with
    /// [`BenchDriver::new`].
    pub fn from_config(config: BenchConfig) -> Result<Self> {
        let notifier = notifier::open_notifier(config.notifier)?;
        Self::new(config, notifier, ProcessClock)
    }
}

impl<N: Notifier, C: TickSource> BenchDriver<N, C> {
    /// Create a driver.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: BenchConfig, notifier: N, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            notifier,
            clock,
        })
    }

    /// The configuration this driver runs with.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// The notifier being signalled.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Give back the notifier, e.g. to inspect its counter.
    pub fn into_notifier(self) -> N {
        self.notifier
    }

    /// Full run: settle, timed loop, cool-down.
    pub fn run(&mut self) -> Result<BenchReport> {
        self.run_and_report(|_| Ok(()))
    }

    /// Full run that calls `emit` with the report after the timed loop and
    /// before the cool-down pause.
    ///
    /// # Errors
    ///
    /// An error from `emit` ends the run without the cool-down.
    pub fn run_and_report<F>(&mut self, emit: F) -> Result<BenchReport>
    where
        F: FnOnce(&BenchReport) -> Result<()>,
    {
        pause("settle", self.config.settle);
        let report = self.run_loop()?;
        emit(&report)?;
        pause("cooldown", self.config.cooldown);
        Ok(report)
    }

    /// Timed loop only, without the surrounding pauses.
    pub fn run_loop(&mut self) -> Result<BenchReport> {
        let iterations = self.config.iterations;
        let value = self.config.signal_value;
        let policy = self.config.failure_policy;

        log_debug!(
            "driver",
            "signalling {} {} times with value {}",
            self.notifier.name(),
            iterations,
            value
        );

        let start = self.clock.now()?;
        let (signals, failures) = signal_loop(&mut self.notifier, iterations, value, policy)?;
        let end = self.clock.now()?;

        let report = BenchReport {
            iterations,
            signals,
            failures,
            ticks: end.elapsed_since(start),
            notifier: self.notifier.name(),
        };

        if failures > 0 {
            log_warn!(
                "driver",
                "{} of {} signals failed on {}",
                failures,
                signals,
                report.notifier
            );
        }
        if logging::log_enabled(LogLevel::Debug) {
            logging::log_entry(
                &LogEntry::new(LogLevel::Debug, "driver", "loop finished")
                    .with_metadata("notifier", report.notifier)
                    .with_metadata("signals", report.signals)
                    .with_metadata("ticks", report.ticks)
                    .with_metadata("ns_per_signal", format!("{:.1}", report.nanos_per_signal())),
            );
        }

        Ok(report)
    }
}

/// The timed region. Returns `(signals, failures)`.
///
/// Kept free of logging and allocation so that the only work per iteration
/// is the signal itself and the counter decrement.
#[inline(never)]
fn signal_loop<N: Notifier + ?Sized>(
    notifier: &mut N,
    iterations: u64,
    value: u64,
    policy: SignalFailurePolicy,
) -> Result<(u64, u64)> {
    let mut remaining = iterations;
    let mut failures = 0u64;

    while remaining > 0 {
        remaining -= 1;
        if let Err(source) = notifier.signal(value) {
            match policy {
                SignalFailurePolicy::Ignore => failures += 1,
                SignalFailurePolicy::Abort => {
                    return Err(BenchError::Signal {
                        iteration: iterations - remaining - 1,
                        source,
                    });
                }
            }
        }
    }

    Ok((iterations, failures))
}

fn pause(what: &str, duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let start = Instant::now();
    thread::sleep(duration);
    logging::log_timing("driver", what, start.elapsed());
}
