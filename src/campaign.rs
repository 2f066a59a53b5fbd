//! Repeated measurement campaigns.
//!
//! A campaign runs the workload many times on one machine: per round, a
//! number of discarded warm-up runs followed by the measured repetitions.
//! Every run, warm-up or measured, is a full driver run (settle pause,
//! loop, cool-down pause) against a freshly created notifier, so runs
//! share no state, just as when every run was a separate process.
//!
//! Results are appended to a CSV file, one row per round:
//!
//! ```text
//! label,round,run 0,run 1
//! 6.8.0-45-generic,0,48211,47902
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::clock::ProcessClock;
use crate::config::{BenchConfig, CampaignConfig};
use crate::driver::BenchDriver;
use crate::error::Result;
use crate::notifier;
use crate::stats::RunStats;
use crate::system_info;
use crate::{log_debug, log_info};

/// Measurements of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// Row label
    pub label: String,
    /// Zero-based round index
    pub round: u32,
    /// Ticks of each measured run, in run order
    pub samples: Vec<u64>,
}

impl RoundResult {
    /// Summary statistics of the round.
    pub fn stats(&self) -> RunStats {
        RunStats::from_samples(&self.samples)
    }
}

/// Drives a campaign.
#[derive(Debug, Clone)]
pub struct Campaign {
    bench: BenchConfig,
    config: CampaignConfig,
    label: String,
}

impl Campaign {
    /// Create a campaign.
    ///
    /// Without an explicit label, rows are labelled with the running
    /// kernel's release, which is what distinguishes results when the
    /// same workload is compared across kernels.
    pub fn new(bench: BenchConfig, config: CampaignConfig) -> Result<Self> {
        bench.validate()?;
        config.validate()?;
        let label = config
            .label
            .clone()
            .unwrap_or_else(system_info::kernel_release);
        Ok(Self {
            bench,
            config,
            label,
        })
    }

    /// Row label used for every round.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Campaign shape.
    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Run every round and return the results.
    pub fn run(&self) -> Result<Vec<RoundResult>> {
        self.run_with(|_| Ok(()))
    }

    /// Run every round, appending each to `writer` as soon as it finishes.
    pub fn run_to_csv<W: Write>(&self, writer: &mut CsvWriter<W>) -> Result<Vec<RoundResult>> {
        self.run_with(|round| writer.write_round(round))
    }

    fn run_with<F>(&self, mut on_round: F) -> Result<Vec<RoundResult>>
    where
        F: FnMut(&RoundResult) -> Result<()>,
    {
        let mut results = Vec::with_capacity(self.config.rounds as usize);

        for round in 0..self.config.rounds {
            log_info!("campaign", "starting round {}", round);
            let result = self.run_round(round)?;
            on_round(&result)?;
            results.push(result);
        }

        Ok(results)
    }

    fn run_round(&self, round: u32) -> Result<RoundResult> {
        log_info!(
            "campaign",
            "evaluating {}: running {} warm-up runs",
            self.label,
            self.config.warmup_runs
        );
        for _ in 0..self.config.warmup_runs {
            let ticks = self.measure()?;
            log_debug!("campaign", "warm-up run: {} ticks", ticks);
        }

        let repetitions = self.config.repetitions;
        let mut samples = Vec::with_capacity(repetitions as usize);
        for i in 0..repetitions {
            let ticks = self.measure()?;
            log_debug!("campaign", "measured run: {} ticks", ticks);
            samples.push(ticks);
            log_info!(
                "campaign",
                "evaluating {}: {}%",
                self.label,
                percent(u64::from(i) + 1, u64::from(repetitions))
            );
        }

        let result = RoundResult {
            label: self.label.clone(),
            round,
            samples,
        };
        log_info!(
            "campaign",
            "evaluating {}: {}",
            self.label,
            result.stats().summary()
        );
        Ok(result)
    }

    /// One full run against a fresh notifier. Returns the loop's ticks.
    fn measure(&self) -> Result<u64> {
        let notifier = notifier::open_notifier(self.bench.notifier)?;
        let report = BenchDriver::new(self.bench.clone(), notifier, ProcessClock)?.run()?;
        Ok(report.ticks.get())
    }
}

fn percent(done: u64, total: u64) -> u64 {
    done * 100 / total.max(1)
}

/// Writes campaign results as CSV.
#[derive(Debug)]
pub struct CsvWriter<W: Write> {
    inner: W,
    repetitions: u32,
}

impl CsvWriter<BufWriter<File>> {
    /// Create (truncate) `path` and write the header.
    pub fn create<P: AsRef<Path>>(path: P, repetitions: u32) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), repetitions)
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `inner` and write the header row.
    pub fn new(mut inner: W, repetitions: u32) -> Result<Self> {
        let mut columns = vec!["label".to_string(), "round".to_string()];
        columns.extend((0..repetitions).map(|i| format!("run {i}")));
        writeln!(inner, "{}", columns.join(","))?;
        inner.flush()?;
        Ok(Self { inner, repetitions })
    }

    /// Number of run columns in the header.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Append one row and flush it.
    pub fn write_round(&mut self, round: &RoundResult) -> Result<()> {
        let mut row = vec![escape_field(&round.label), round.round.to_string()];
        row.extend(round.samples.iter().map(u64::to_string));
        writeln!(self.inner, "{}", row.join(","))?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::notifier::NotifierKind;
    use std::time::{Duration, Instant};

    fn atomic_bench(iterations: u64) -> BenchConfig {
        ConfigBuilder::from_config(BenchConfig::quick())
            .iterations(iterations)
            .notifier(NotifierKind::Atomic)
            .build()
            .unwrap()
    }

    fn shape(rounds: u32, repetitions: u32, warmup_runs: u32) -> CampaignConfig {
        CampaignConfig {
            rounds,
            repetitions,
            warmup_runs,
            label: Some("test".into()),
            ..CampaignConfig::default()
        }
    }

    #[test]
    fn produces_one_result_per_round() {
        let campaign = Campaign::new(atomic_bench(100), shape(3, 4, 1)).unwrap();
        let results = campaign.run().unwrap();

        assert_eq!(results.len(), 3);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.round, i as u32);
            assert_eq!(result.label, "test");
            assert_eq!(result.samples.len(), 4);
        }
    }

    #[test]
    fn default_label_is_kernel_release() {
        let config = CampaignConfig {
            label: None,
            ..shape(1, 1, 0)
        };
        let campaign = Campaign::new(atomic_bench(10), config).unwrap();
        assert_eq!(campaign.label(), system_info::kernel_release());
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(Campaign::new(atomic_bench(10), shape(1, 0, 0)).is_err());
        let mut bench = atomic_bench(10);
        bench.iterations = 0;
        assert!(Campaign::new(bench, shape(1, 1, 0)).is_err());
    }

    #[test]
    fn csv_header_and_rows() {
        let mut writer = CsvWriter::new(Vec::new(), 2).unwrap();
        writer
            .write_round(&RoundResult {
                label: "6.8.0".into(),
                round: 0,
                samples: vec![48211, 47902],
            })
            .unwrap();
        writer
            .write_round(&RoundResult {
                label: "with,comma".into(),
                round: 1,
                samples: vec![1, 2],
            })
            .unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "label,round,run 0,run 1\n6.8.0,0,48211,47902\n\"with,comma\",1,1,2\n"
        );
    }

    #[test]
    fn run_to_csv_writes_every_round() {
        let campaign = Campaign::new(atomic_bench(50), shape(2, 3, 0)).unwrap();
        let mut writer = CsvWriter::new(Vec::new(), 3).unwrap();

        let results = campaign.run_to_csv(&mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(results.len(), 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "label,round,run 0,run 1,run 2");
        assert!(lines[1].starts_with("test,0,"));
        assert!(lines[2].starts_with("test,1,"));
        assert_eq!(lines[2].split(',').count(), 5);
    }

    #[test]
    fn warmups_include_pauses() {
        let bench = ConfigBuilder::from_config(atomic_bench(10))
            .pauses(Duration::from_millis(20))
            .build()
            .unwrap();
        let campaign = Campaign::new(bench, shape(1, 1, 2)).unwrap();

        let started = Instant::now();
        campaign.run().unwrap();

        // Three runs, each with two 20 ms pauses.
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn progress_percent_does_not_overflow() {
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(4, 4), 100);
        let many = u64::from(u32::MAX);
        assert_eq!(percent(many, many), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn escapes_quotes() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
