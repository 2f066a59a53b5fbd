//! `eventfd-bench`: time N eventfd signals and print the CPU ticks.
//!
//! With no arguments this is the one-million-iteration workload: it pauses
//! 200 ms, signals an eventfd 1,000,000 times, prints the elapsed CPU ticks
//! as a single line on stdout, then pauses another 200 ms and exits 0.
//! Diagnostics only ever go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use eventfd_bench::config::{LONG_ITERATIONS, SHORT_ITERATIONS};
use eventfd_bench::logging::{self, LogLevel};
use eventfd_bench::{
    log_debug, log_error, notifier, BenchConfig, BenchDriver, BenchReport, ConfigBuilder,
    LoggingConfig, NotifierKind, ProcessClock, Result, SignalFailurePolicy,
};

/// Measure the CPU cost of signalling an eventfd in a tight loop.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Number of signals to time.
    #[clap(short = 'n', long, default_value_t = LONG_ITERATIONS, conflicts_with = "short")]
    iterations: u64,
    /// Use the 100,000 iteration preset.
    #[clap(long)]
    short: bool,
    /// Value added to the counter by each signal.
    #[clap(long, default_value_t = 1)]
    value: u64,
    /// Pause before the timed loop, in milliseconds.
    #[clap(long, default_value_t = 200)]
    settle_ms: u64,
    /// Pause after the timed loop, in milliseconds.
    #[clap(long, default_value_t = 200)]
    cooldown_ms: u64,
    /// Signal an in-process atomic counter instead of an eventfd.
    #[clap(long)]
    atomic: bool,
    /// Fail instead of carrying on when the eventfd cannot be created or a
    /// signal fails.
    #[clap(long)]
    strict: bool,
    /// Increase stderr verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Write logs as JSON.
    #[clap(long)]
    json_logs: bool,
    /// Append logs to this file instead of stderr.
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn to_config(&self) -> Result<BenchConfig> {
        let iterations = if self.short {
            SHORT_ITERATIONS
        } else {
            self.iterations
        };
        let notifier = if self.atomic {
            NotifierKind::Atomic
        } else {
            NotifierKind::EventFd
        };
        let policy = if self.strict {
            SignalFailurePolicy::Abort
        } else {
            SignalFailurePolicy::Ignore
        };

        ConfigBuilder::new()
            .iterations(iterations)
            .signal_value(self.value)
            .settle(Duration::from_millis(self.settle_ms))
            .cooldown(Duration::from_millis(self.cooldown_ms))
            .notifier(notifier)
            .failure_policy(policy)
            .logging(LoggingConfig {
                enabled: true,
                level: LogLevel::from_verbosity(self.verbose),
                log_file: self.log_file.clone(),
                json_format: self.json_logs,
            })
            .build()
    }
}

/// Write the measurement line and flush it, so it is visible before the
/// cool-down pause.
fn emit<W: Write>(out: &mut W, report: &BenchReport) -> Result<()> {
    writeln!(out, "{}", report.output_line())?;
    out.flush()?;
    Ok(())
}

fn run(config: BenchConfig, strict: bool) -> Result<BenchReport> {
    let notifier = if strict {
        notifier::open_notifier(config.notifier)?
    } else {
        notifier::open_or_fallback(config.notifier)
    };

    log_debug!(
        "main",
        "{} iterations against {}",
        config.iterations,
        notifier.name()
    );
    BenchDriver::new(config, notifier, ProcessClock)?
        .run_and_report(|report| emit(&mut io::stdout().lock(), report))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("eventfd-bench: {e}");
            return ExitCode::from(2);
        }
    };
    logging::init_logger(&config.logging);

    let code = match run(config, cli.strict) {
        Ok(report) => {
            log_debug!("main", "{} signals, {} failed", report.signals, report.failures);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("main", "benchmark failed: {}", e);
            ExitCode::FAILURE
        }
    };

    logging::flush();
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_is_the_long_workload() {
        let cli = Cli::try_parse_from(["eventfd-bench"]).unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.iterations, 1_000_000);
        assert_eq!(config.signal_value, 1);
        assert_eq!(config.settle, Duration::from_millis(200));
        assert_eq!(config.cooldown, Duration::from_millis(200));
        assert_eq!(config.notifier, NotifierKind::EventFd);
        assert_eq!(config.failure_policy, SignalFailurePolicy::Ignore);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn short_preset_flag() {
        let cli = Cli::try_parse_from(["eventfd-bench", "--short"]).unwrap();
        assert_eq!(cli.to_config().unwrap().iterations, 100_000);
    }

    #[test]
    fn short_conflicts_with_iterations() {
        assert!(Cli::try_parse_from(["eventfd-bench", "--short", "-n", "5"]).is_err());
    }

    #[test]
    fn explicit_options() {
        let cli = Cli::try_parse_from([
            "eventfd-bench",
            "-n",
            "2500",
            "--value",
            "4",
            "--settle-ms",
            "0",
            "--cooldown-ms",
            "10",
            "--atomic",
            "--strict",
            "-vv",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.iterations, 2_500);
        assert_eq!(config.signal_value, 4);
        assert_eq!(config.settle, Duration::ZERO);
        assert_eq!(config.cooldown, Duration::from_millis(10));
        assert_eq!(config.notifier, NotifierKind::Atomic);
        assert_eq!(config.failure_policy, SignalFailurePolicy::Abort);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn emit_writes_one_line() {
        let report = BenchReport {
            iterations: 10,
            signals: 10,
            failures: 0,
            ticks: eventfd_bench::Ticks::new(42),
            notifier: "atomic",
        };
        let mut out = Vec::new();
        emit(&mut out, &report).unwrap();
        assert_eq!(out, b"42\n");
    }

    /// Writer whose reader has gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emit_reports_closed_stdout() {
        let report = BenchReport {
            iterations: 1,
            signals: 1,
            failures: 0,
            ticks: eventfd_bench::Ticks::ZERO,
            notifier: "atomic",
        };
        assert!(matches!(
            emit(&mut ClosedPipe, &report),
            Err(eventfd_bench::BenchError::Io(_))
        ));
    }

    #[test]
    fn zero_iterations_is_invalid() {
        let cli = Cli::try_parse_from(["eventfd-bench", "-n", "0"]).unwrap();
        assert!(cli.to_config().is_err());
    }
}
