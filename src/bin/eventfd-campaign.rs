//! `eventfd-campaign`: run the eventfd workload repeatedly and record the
//! results as CSV.
//!
//! Each round performs the warm-up runs, then the measured runs, then
//! appends `label,round,run 0,...` to the output file. Progress and the
//! per-round `average=.., stdev=..` summary are logged to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use eventfd_bench::config::{LONG_ITERATIONS, SHORT_ITERATIONS};
use eventfd_bench::logging::{self, LogLevel};
use eventfd_bench::{
    log_error, log_info, BenchConfig, Campaign, CampaignConfig, ConfigBuilder, CsvWriter,
    LoggingConfig, NotifierKind, Result, RoundResult, SystemInfo,
};

/// Repeat the eventfd signal benchmark and write the measurements to CSV.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Path of the output file.
    #[clap(short, long, default_value = "eventfd-bench.csv")]
    out: PathBuf,
    /// Number of rounds.
    #[clap(long, default_value_t = 1)]
    rounds: u32,
    /// Measured runs per round.
    #[clap(long, default_value_t = 2)]
    repetitions: u32,
    /// Discarded runs before the measured runs of each round.
    #[clap(long, default_value_t = 5)]
    warmup: u32,
    /// Signals per run.
    #[clap(short = 'n', long, default_value_t = LONG_ITERATIONS, conflicts_with = "short")]
    iterations: u64,
    /// Use the 100,000 iteration preset.
    #[clap(long)]
    short: bool,
    /// Pause before each measured loop, in milliseconds.
    #[clap(long, default_value_t = 200)]
    settle_ms: u64,
    /// Pause after each measured loop, in milliseconds.
    #[clap(long, default_value_t = 200)]
    cooldown_ms: u64,
    /// Row label (defaults to the kernel release).
    #[clap(short, long)]
    label: Option<String>,
    /// Signal an in-process atomic counter instead of an eventfd.
    #[clap(long)]
    atomic: bool,
    /// Reduce stderr output to warnings and errors.
    #[clap(short, long)]
    quiet: bool,
    /// Increase stderr verbosity (-v debug, -vv trace).
    #[clap(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Warn
        } else {
            // Progress is the point of this binary, so start at Info.
            LogLevel::from_verbosity(self.verbose.saturating_add(1))
        }
    }

    fn bench_config(&self) -> Result<BenchConfig> {
        ConfigBuilder::new()
            .iterations(if self.short {
                SHORT_ITERATIONS
            } else {
                self.iterations
            })
            .settle(Duration::from_millis(self.settle_ms))
            .cooldown(Duration::from_millis(self.cooldown_ms))
            .notifier(if self.atomic {
                NotifierKind::Atomic
            } else {
                NotifierKind::EventFd
            })
            .logging(LoggingConfig {
                enabled: true,
                level: self.log_level(),
                log_file: None,
                json_format: false,
            })
            .build()
    }

    fn campaign_config(&self) -> CampaignConfig {
        CampaignConfig {
            rounds: self.rounds,
            repetitions: self.repetitions,
            warmup_runs: self.warmup,
            output: self.out.clone(),
            label: self.label.clone(),
        }
    }
}

fn run(cli: &Cli) -> Result<Vec<RoundResult>> {
    let bench = cli.bench_config()?;
    logging::init_logger(&bench.logging);

    let campaign = Campaign::new(bench, cli.campaign_config())?;
    for line in SystemInfo::collect().describe() {
        log_info!("system", "{}", line);
    }
    log_info!(
        "campaign",
        "{} rounds x ({} warm-up + {} measured) runs, label '{}', writing {}",
        campaign.config().rounds,
        campaign.config().warmup_runs,
        campaign.config().repetitions,
        campaign.label(),
        campaign.config().output.display()
    );

    let mut writer = CsvWriter::create(&campaign.config().output, campaign.config().repetitions)?;
    let results = campaign.run_to_csv(&mut writer)?;
    writer.into_inner()?;
    Ok(results)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(results) => {
            log_info!("campaign", "finished {} rounds", results.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The logger may not be installed yet if configuration failed.
            if logging::log_enabled(LogLevel::Error) {
                log_error!("campaign", "{}", e);
            } else {
                eprintln!("eventfd-campaign: {e}");
            }
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
    fn default_campaign_shape() {
        let cli = Cli::try_parse_from(["eventfd-campaign"]).unwrap();
        let campaign = cli.campaign_config();

        assert_eq!(campaign.rounds, 1);
        assert_eq!(campaign.repetitions, 2);
        assert_eq!(campaign.warmup_runs, 5);
        assert_eq!(campaign.output, PathBuf::from("eventfd-bench.csv"));
        assert_eq!(cli.bench_config().unwrap().iterations, 1_000_000);
        assert_eq!(cli.log_level(), LogLevel::Info);
    }

    #[test]
    fn quiet_and_verbose() {
        let quiet = Cli::try_parse_from(["eventfd-campaign", "-q"]).unwrap();
        assert_eq!(quiet.log_level(), LogLevel::Warn);

        let verbose = Cli::try_parse_from(["eventfd-campaign", "-v"]).unwrap();
        assert_eq!(verbose.log_level(), LogLevel::Debug);

        assert!(Cli::try_parse_from(["eventfd-campaign", "-q", "-v"]).is_err());
    }

    #[test]
    fn short_preset_and_label() {
        let cli = Cli::try_parse_from([
            "eventfd-campaign",
            "--short",
            "--label",
            "baseline",
            "--atomic",
        ])
        .unwrap();
        let bench = cli.bench_config().unwrap();

        assert_eq!(bench.iterations, 100_000);
        assert_eq!(bench.notifier, NotifierKind::Atomic);
        assert_eq!(cli.campaign_config().label.as_deref(), Some("baseline"));
    }
}
