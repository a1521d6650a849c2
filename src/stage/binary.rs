//! Shared machinery for binary projection stages.
//!
//! A projection pairs every left series with a right operand and combines
//! them sample by sample. Implementors supply the per-sample combiner, the
//! policy for collapsing several matching right series, and optionally a
//! label rewrite. Alignment, matching and dispatch are provided here.

use crate::error::{Error, Result};
use crate::series::{Labels, Sample, TimeSeries};
use tracing::trace;

/// Argument key naming the aggregation that supplies the right operand.
pub const RIGHT_OP_REFERENCE_ARG: &str = "right_op_reference";
/// Argument key holding the label keys used for matching.
pub const LABELS_ARG: &str = "labels";

pub trait BinaryProjection {
    fn name(&self) -> &'static str;

    /// Keys compared when matching. Empty means full label equality.
    fn label_keys(&self) -> &[String];

    /// Whether unmatched timestamps on either side still reach
    /// [`process_samples`](Self::process_samples).
    fn keep_nans(&self) -> bool;

    /// Combine one aligned pair. At least one side is present.
    fn process_samples(&self, left: Option<&Sample>, right: Option<&Sample>) -> Option<Sample>;

    /// Collapse every right series matching one left series into one operand.
    fn merge_matching_series(&self, matches: Vec<&TimeSeries>) -> Option<TimeSeries>;

    fn transform_labels(&self, labels: &Labels) -> Labels {
        labels.clone()
    }

    /// Project `left` onto `right`.
    ///
    /// A single right series is broadcast against every left series without
    /// label matching. Otherwise each left series is paired with its matching
    /// right series and dropped when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullInput`] if either side is absent.
    fn process(
        &self,
        left: Option<Vec<TimeSeries>>,
        right: Option<Vec<TimeSeries>>,
    ) -> Result<Vec<TimeSeries>> {
        let null_input = |side: &str| {
            Error::NullInput(format!("{} stage received null {side} input", self.name()))
        };
        let left = left.ok_or_else(|| null_input("left"))?;
        let right = right.ok_or_else(|| null_input("right"))?;
        if left.is_empty() || right.is_empty() {
            return Ok(Vec::new());
        }

        let out: Vec<TimeSeries> = if let [single] = right.as_slice() {
            left.iter().filter_map(|l| self.align_and_process(l, single)).collect()
        } else {
            left.iter()
                .filter_map(|l| {
                    let matches = find_matching(&right, l.labels(), self.label_keys());
                    let operand = self.merge_matching_series(matches)?;
                    self.align_and_process(l, &operand)
                })
                .collect()
        };

        trace!(
            stage = self.name(),
            left_series = left.len(),
            right_series = right.len(),
            output_series = out.len(),
            "binary projection"
        );
        Ok(out)
    }

    /// Merge-join two series on timestamp.
    ///
    /// Equal timestamps are combined. A timestamp present on one side only is
    /// combined with `None` when [`keep_nans`](Self::keep_nans) holds and
    /// skipped otherwise. Returns `None` when nothing was produced.
    fn align_and_process(&self, left: &TimeSeries, right: &TimeSeries) -> Option<TimeSeries> {
        let ls = left.samples();
        let rs = right.samples();
        let keep_nans = self.keep_nans();
        let mut out = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);

        while i < ls.len() || j < rs.len() {
            let lt = ls.get(i).map_or(i64::MAX, |s| s.timestamp);
            let rt = rs.get(j).map_or(i64::MAX, |s| s.timestamp);

            let produced = if lt < rt {
                i += 1;
                if keep_nans { self.process_samples(ls.get(i - 1), None) } else { None }
            } else if rt < lt {
                j += 1;
                if keep_nans { self.process_samples(None, rs.get(j - 1)) } else { None }
            } else {
                i += 1;
                j += 1;
                self.process_samples(ls.get(i - 1), rs.get(j - 1))
            };

            if let Some(sample) = produced {
                out.push(sample);
            }
        }

        if out.is_empty() {
            return None;
        }

        Some(TimeSeries::new_unchecked(
            out,
            self.transform_labels(left.labels()),
            left.min_timestamp().min(right.min_timestamp()),
            left.max_timestamp().max(right.max_timestamp()),
            left.step(),
            left.alias().map(str::to_owned),
        ))
    }
}

/// Whether `right` matches `left` on `keys`, or on every label when `keys`
/// is empty. A key missing on either side never matches.
pub fn labels_match(left: &Labels, right: &Labels, keys: &[String]) -> bool {
    if keys.is_empty() {
        return left == right;
    }
    keys.iter().all(|k| match (left.get(k), right.get(k)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    })
}

/// Right series whose labels match `target`, in input order.
pub fn find_matching<'a>(
    right: &'a [TimeSeries],
    target: &Labels,
    keys: &[String],
) -> Vec<&'a TimeSeries> {
    right.iter().filter(|s| labels_match(target, s.labels(), keys)).collect()
}
