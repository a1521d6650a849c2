//! Exact percentile summarizer.
//!
//! Buckets are small (one summarize interval of one series), so values are
//! buffered and sorted at finish time instead of sketched.

use super::BucketSummarizer;
use ordered_float::OrderedFloat;

/* ===================== Percentile ===================== */

/// `p`-th percentile (`0..=100`) of the bucket's values.
///
/// Values are sorted and the result interpolates linearly between the two
/// closest ranks at `p / 100 * (n - 1)`. `p0` is the minimum and `p100` the
/// maximum. The result depends only on the multiset of values.
#[derive(Clone, Debug)]
pub struct PercentileSummarizer {
    percentile: f64,
    values: Vec<OrderedFloat<f64>>,
}

impl PercentileSummarizer {
    pub fn new(percentile: f64) -> Self {
        debug_assert!((0.0..=100.0).contains(&percentile));
        Self { percentile, values: Vec::new() }
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }
}

impl BucketSummarizer for PercentileSummarizer {
    fn reset(&mut self) {
        self.values.clear();
    }

    fn accumulate(&mut self, value: f64) {
        self.values.push(OrderedFloat(value));
    }

    fn has_data(&self) -> bool {
        !self.values.is_empty()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn finish(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        let mut sorted = self.values.clone();
        sorted.sort_unstable();

        let rank = self.percentile / 100.0 * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let lo_v = sorted[lo].into_inner();
        if lo == hi {
            return lo_v;
        }
        let hi_v = sorted[hi].into_inner();
        lo_v + (hi_v - lo_v) * (rank - lo as f64)
    }
}
