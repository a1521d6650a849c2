//! Statistical summarizers: `StdDevSummarizer`

use super::BucketSummarizer;

/* ===================== StdDev ===================== */

/// Population standard deviation of the bucket's values.
///
/// Uses Welford's online update, so values are never buffered.
///
/// - State: `(count, mean, m2)`
/// - Output: `sqrt(m2 / count)`
///
/// A single value yields `0.0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDevSummarizer {
    count: u64,
    mean: f64,
    m2: f64,
}

impl StdDevSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for StdDevSummarizer {
    fn reset(&mut self) {
        *self = Self::default();
    }

    #[allow(clippy::cast_precision_loss)]
    fn accumulate(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn has_data(&self) -> bool {
        self.count > 0
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        (self.m2 / self.count as f64).sqrt()
    }
}
