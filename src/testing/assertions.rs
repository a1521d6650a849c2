//! Assertion functions for stage and query outputs.

use crate::series::{Sample, TimeSeries};
use crate::window::TimestampMs;

/// Tolerance for value comparisons.
pub const EPSILON: f64 = 1e-9;

fn values_match(a: f64, e: f64) -> bool {
    (a.is_nan() && e.is_nan()) || a == e || (a - e).abs() <= EPSILON * e.abs().max(1.0)
}

/// Assert that samples equal `(timestamp, value)` pairs in order.
///
/// NaN equals NaN; other values compare within [`EPSILON`] (relative for
/// large magnitudes).
///
/// # Panics
///
/// Panics if the lengths, any timestamp or any value differ.
///
/// # Example
///
/// ```
/// use ironseries::series::Sample;
/// use ironseries::testing::assert_samples_eq;
///
/// let actual = vec![Sample::new(0, 1.0), Sample::new(10, f64::NAN)];
/// assert_samples_eq(&actual, &[(0, 1.0), (10, f64::NAN)]);
/// ```
pub fn assert_samples_eq(actual: &[Sample], expected: &[(TimestampMs, f64)]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Sample count mismatch:\n  Expected length: {}\n  Actual length: {}\n  \
         Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, (ets, ev))) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            a.timestamp == *ets && values_match(a.value, *ev),
            "Sample mismatch at index {i}:\n  Expected: ({ets}, {ev})\n  Actual: ({}, {})\n  \
             Full expected: {expected:?}\n  Full actual: {actual:?}",
            a.timestamp,
            a.value
        );
    }
}

/// Assert that a series' sample timestamps are exactly `expected`.
///
/// # Panics
///
/// Panics if they differ.
pub fn assert_timestamps(series: &TimeSeries, expected: &[TimestampMs]) {
    let actual: Vec<TimestampMs> = series.samples().iter().map(|s| s.timestamp).collect();
    assert_eq!(
        actual, expected,
        "Timestamp mismatch for series {}:\n  Expected: {expected:?}\n  Actual: {actual:?}",
        series.labels()
    );
}

/// Assert the value of `label` across series, in order.
///
/// # Panics
///
/// Panics if the series count differs or any series has a different value
/// (or lacks the label).
///
/// # Example
///
/// ```
/// use ironseries::testing::{assert_label_values, named_series};
///
/// # fn main() -> anyhow::Result<()> {
/// let out = vec![named_series("a")?, named_series("b")?];
/// assert_label_values(&out, "name", &["a", "b"]);
/// # Ok(())
/// # }
/// ```
pub fn assert_label_values(series: &[TimeSeries], label: &str, expected: &[&str]) {
    let actual: Vec<Option<&str>> = series.iter().map(|s| s.labels().get(label)).collect();
    let wanted: Vec<Option<&str>> = expected.iter().map(|e| Some(*e)).collect();
    assert_eq!(
        actual, wanted,
        "Label '{label}' mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}
