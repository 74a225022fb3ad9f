use serde::{Deserialize, Serialize};

/// Keep at most this many samples per series; older ones are dropped.
const MAX_SAMPLES: usize = 10_000;

/// A bounded series of samples with count/sum kept over all time.
#[derive(Debug, Clone, Default)]
pub(crate) struct Samples {
    values: Vec<f64>,
    count: u64,
    sum: f64,
    max: f64,
}

impl Samples {
    pub(crate) fn record(&mut self, value: f64) {
        self.values.push(value);
        if self.values.len() > MAX_SAMPLES {
            self.values.drain(..self.values.len() - MAX_SAMPLES);
        }
        self.count += 1;
        self.sum += value;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    /// Value at the given percentile (0.0–1.0) over the retained samples.
    pub(crate) fn percentile(&self, p: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mut sorted = self.values.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        let idx = ((p * (sorted.len() - 1) as f64).round() as usize).min(sorted.len() - 1);
        sorted[idx]
    }

    pub(crate) fn stats(&self) -> SummaryStats {
        SummaryStats {
            count: self.count,
            sum: self.sum,
            max: self.max,
            mean: if self.count == 0 {
                0.0
            } else {
                self.sum / self.count as f64
            },
            p50: self.percentile(0.5),
            p75: self.percentile(0.75),
            p90: self.percentile(0.9),
            p99: self.percentile(0.99),
        }
    }
}

/// Aggregate view of a distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: u64,
    pub sum: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p99: f64,
}
