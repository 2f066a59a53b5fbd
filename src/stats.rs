//! Summary statistics over repeated measurements.

/// Statistics over a set of tick measurements.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    samples: Vec<u64>,
}

impl RunStats {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the given samples.
    pub fn from_samples(samples: &[u64]) -> Self {
        Self {
            samples: samples.to_vec(),
        }
    }

    /// Records one measurement.
    pub fn record(&mut self, sample: u64) {
        self.samples.push(sample);
    }

    /// Number of samples.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Recorded samples in insertion order.
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    /// Arithmetic mean, if any samples were recorded.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u128 = self.samples.iter().map(|&s| u128::from(s)).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator).
    ///
    /// Needs at least two samples, as with Python's `statistics.stdev`.
    pub fn stdev(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum();
        Some((sum_sq / (self.samples.len() - 1) as f64).sqrt())
    }

    /// Smallest sample.
    pub fn min(&self) -> Option<u64> {
        self.samples.iter().copied().min()
    }

    /// Largest sample.
    pub fn max(&self) -> Option<u64> {
        self.samples.iter().copied().max()
    }

    /// Median (lower middle for an even count).
    pub fn median(&self) -> Option<u64> {
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let len = sorted.len();
        if len == 0 {
            return None;
        }
        Some(sorted[(len - 1) / 2])
    }

    /// One-line summary: `average=<n>, stdev=<n>`.
    ///
    /// Values are truncated to integers; a missing stdev prints as `n/a`.
    pub fn summary(&self) -> String {
        let average = self
            .mean()
            .map_or_else(|| "n/a".to_string(), |m| format!("{}", m as u64));
        let stdev = self
            .stdev()
            .map_or_else(|| "n/a".to_string(), |s| format!("{}", s as u64));
        format!("average={average}, stdev={stdev}")
    }
}

impl FromIterator<u64> for RunStats {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl Extend<u64> for RunStats {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}
