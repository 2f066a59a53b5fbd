//! Benchmark and campaign configuration.
//!
//! The loop count is a parameter. The two standard workloads are the
//! [`BenchConfig::long`] and [`BenchConfig::short`] presets.

use crate::error::{BenchError, Result};
use crate::logging::LogLevel;
use crate::notifier::{NotifierKind, MAX_COUNTER};
use std::path::PathBuf;
use std::time::Duration;

/// Iteration count of the long preset.
pub const LONG_ITERATIONS: u64 = 1_000_000;

/// Iteration count of the short preset.
pub const SHORT_ITERATIONS: u64 = 100_000;

/// Pause before and after the timed loop.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(200);

/// Upper bound accepted for either pause.
pub const MAX_PAUSE: Duration = Duration::from_secs(60);

/// Upper bound on campaign rounds.
pub const MAX_ROUNDS: u32 = 10_000;

/// Upper bound on measured or warm-up runs per round.
pub const MAX_RUNS_PER_ROUND: u32 = 100_000;

/// What the driver does when a signal operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalFailurePolicy {
    /// Count the failure and keep looping.
    #[default]
    Ignore,
    /// Stop the run at the first failure.
    Abort,
}

/// Configuration of a single benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of signal operations in the timed loop
    pub iterations: u64,
    /// Value added to the counter by each signal
    pub signal_value: u64,
    /// Pause before the timed loop
    pub settle: Duration,
    /// Pause after the timed loop
    pub cooldown: Duration,
    /// Notifier implementation to signal
    pub notifier: NotifierKind,
    /// Handling of failed signals
    pub failure_policy: SignalFailurePolicy,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Minimum log level
    pub level: LogLevel,
    /// Log file path (None = stderr)
    pub log_file: Option<PathBuf>,
    /// Use JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Warn,
            log_file: None,
            json_format: false,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::long()
    }
}

impl BenchConfig {
    /// One million signals with 200 ms pauses.
    pub fn long() -> Self {
        Self {
            iterations: LONG_ITERATIONS,
            signal_value: 1,
            settle: DEFAULT_PAUSE,
            cooldown: DEFAULT_PAUSE,
            notifier: NotifierKind::EventFd,
            failure_policy: SignalFailurePolicy::Ignore,
            logging: LoggingConfig::default(),
        }
    }

    /// One hundred thousand signals with 200 ms pauses.
    pub fn short() -> Self {
        Self {
            iterations: SHORT_ITERATIONS,
            ..Self::long()
        }
    }

    /// A thousand signals and no pauses, for tests and smoke runs.
    pub fn quick() -> Self {
        Self {
            iterations: 1_000,
            settle: Duration::ZERO,
            cooldown: Duration::ZERO,
            ..Self::long()
        }
    }

    /// Check the configuration for values the driver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BenchError::InvalidConfig(
                "iterations must be greater than 0".into(),
            ));
        }

        if self.signal_value == 0 || self.signal_value > MAX_COUNTER {
            return Err(BenchError::InvalidConfig(format!(
                "signal value must be between 1 and {MAX_COUNTER}"
            )));
        }

        for (name, pause) in [("settle", self.settle), ("cooldown", self.cooldown)] {
            if pause > MAX_PAUSE {
                return Err(BenchError::InvalidConfig(format!(
                    "{name} pause must not exceed {}s",
                    MAX_PAUSE.as_secs()
                )));
            }
        }

        Ok(())
    }
}

/// Configuration of a repeated-measurement campaign.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Number of rounds
    pub rounds: u32,
    /// Measured runs per round
    pub repetitions: u32,
    /// Discarded runs before the measured runs of each round
    pub warmup_runs: u32,
    /// CSV output path
    pub output: PathBuf,
    /// Row label (None = kernel release)
    pub label: Option<String>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            rounds: 1,
            repetitions: 2,
            warmup_runs: 5,
            output: PathBuf::from("eventfd-bench.csv"),
            label: None,
        }
    }
}

impl CampaignConfig {
    /// Check the campaign shape.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(BenchError::InvalidConfig(
                "rounds must be greater than 0".into(),
            ));
        }

        if self.repetitions == 0 {
            return Err(BenchError::InvalidConfig(
                "repetitions must be greater than 0".into(),
            ));
        }

        if self.rounds > MAX_ROUNDS {
            return Err(BenchError::InvalidConfig(format!(
                "rounds must not exceed {MAX_ROUNDS}"
            )));
        }

        for (name, runs) in [
            ("repetitions", self.repetitions),
            ("warm-up runs", self.warmup_runs),
        ] {
            if runs > MAX_RUNS_PER_ROUND {
                return Err(BenchError::InvalidConfig(format!(
                    "{name} must not exceed {MAX_RUNS_PER_ROUND}"
                )));
            }
        }

        if let Some(label) = &self.label {
            if label.contains(['\n', '\r']) {
                return Err(BenchError::InvalidConfig(
                    "label must be a single line".into(),
                ));
            }
        }

        Ok(())
    }

    /// Total number of runs, warm-up included.
    pub fn total_runs(&self) -> u64 {
        u64::from(self.rounds) * (u64::from(self.warmup_runs) + u64::from(self.repetitions))
    }
}

/// Fluent construction of a [`BenchConfig`].
#[derive(Debug)]
pub struct ConfigBuilder {
    config: BenchConfig,
}

impl ConfigBuilder {
    /// Start from the long preset.
    pub fn new() -> Self {
        Self {
            config: BenchConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: BenchConfig) -> Self {
        Self { config }
    }

    /// Set the iteration count.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the value added per signal.
    pub fn signal_value(mut self, value: u64) -> Self {
        self.config.signal_value = value;
        self
    }

    /// Set the pause before the loop.
    pub fn settle(mut self, settle: Duration) -> Self {
        self.config.settle = settle;
        self
    }

    /// Set the pause after the loop.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Set both pauses.
    pub fn pauses(self, pause: Duration) -> Self {
        self.settle(pause).cooldown(pause)
    }

    /// Choose the notifier.
    pub fn notifier(mut self, notifier: NotifierKind) -> Self {
        self.config.notifier = notifier;
        self
    }

    /// Choose the failure policy.
    pub fn failure_policy(mut self, policy: SignalFailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Set logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<BenchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
