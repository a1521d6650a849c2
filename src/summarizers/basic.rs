//! Basic summarizers: Sum, Avg, Min, Max, Last

use super::BucketSummarizer;

/* ===================== Sum ===================== */

/// Sum of the bucket's values.
///
/// - State: running sum and a seen flag
/// - Output: `f64`
#[derive(Clone, Copy, Debug, Default)]
pub struct SumSummarizer {
    sum: f64,
    seen: bool,
}

impl SumSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for SumSummarizer {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accumulate(&mut self, value: f64) {
        self.sum += value;
        self.seen = true;
    }

    fn has_data(&self) -> bool {
        self.seen
    }

    fn finish(&self) -> f64 {
        if self.seen { self.sum } else { f64::NAN }
    }
}

/* ===================== Avg ===================== */

/// Arithmetic mean of the bucket's values.
///
/// - State: `(sum, count)`
/// - Output: `f64`
#[derive(Clone, Copy, Debug, Default)]
pub struct AvgSummarizer {
    sum: f64,
    count: u64,
}

impl AvgSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for AvgSummarizer {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accumulate(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn has_data(&self) -> bool {
        self.count > 0
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.sum / self.count as f64 }
    }
}

/* ===================== Min ===================== */

/// Smallest value in the bucket.
///
/// - State: `Option<f64>`
/// - Output: `f64`
#[derive(Clone, Copy, Debug, Default)]
pub struct MinSummarizer {
    current: Option<f64>,
}

impl MinSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for MinSummarizer {
    fn reset(&mut self) {
        self.current = None;
    }

    fn accumulate(&mut self, value: f64) {
        match self.current {
            Some(cur) => {
                if value < cur {
                    self.current = Some(value);
                }
            }
            None => self.current = Some(value),
        }
    }

    fn has_data(&self) -> bool {
        self.current.is_some()
    }

    fn finish(&self) -> f64 {
        self.current.unwrap_or(f64::NAN)
    }
}

/* ===================== Max ===================== */

/// Largest value in the bucket.
///
/// - State: `Option<f64>`
/// - Output: `f64`
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxSummarizer {
    current: Option<f64>,
}

impl MaxSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for MaxSummarizer {
    fn reset(&mut self) {
        self.current = None;
    }

    fn accumulate(&mut self, value: f64) {
        match self.current {
            Some(cur) => {
                if value > cur {
                    self.current = Some(value);
                }
            }
            None => self.current = Some(value),
        }
    }

    fn has_data(&self) -> bool {
        self.current.is_some()
    }

    fn finish(&self) -> f64 {
        self.current.unwrap_or(f64::NAN)
    }
}

/* ===================== Last ===================== */

/// Most recently accumulated value. Samples arrive in timestamp order, so this
/// is the value with the latest timestamp in the bucket.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastSummarizer {
    last: Option<f64>,
}

impl LastSummarizer {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSummarizer for LastSummarizer {
    fn reset(&mut self) {
        self.last = None;
    }

    fn accumulate(&mut self, value: f64) {
        self.last = Some(value);
    }

    fn has_data(&self) -> bool {
        self.last.is_some()
    }

    fn finish(&self) -> f64 {
        self.last.unwrap_or(f64::NAN)
    }
}
