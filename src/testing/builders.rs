//! Builders for series and shard inputs.

use crate::error::Result;
use crate::runner::ShardInput;
use crate::series::{Labels, Sample, TimeSeries};
use crate::window::TimestampMs;

/// A fluent builder for one [`TimeSeries`].
///
/// Bounds default to the first and last point; set them with
/// [`bounds`](Self::bounds) to model a range wider than the data.
///
/// # Example
///
/// ```
/// use ironseries::testing::SeriesBuilder;
///
/// # fn main() -> anyhow::Result<()> {
/// let s = SeriesBuilder::new(1_000)
///     .label("dc", "east")
///     .range(0, 5, |i| i as f64)
///     .build()?;
///
/// assert_eq!(s.len(), 5);
/// assert_eq!(s.max_timestamp(), 4_000);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SeriesBuilder {
    step: i64,
    labels: Vec<(String, String)>,
    samples: Vec<Sample>,
    bounds: Option<(TimestampMs, TimestampMs)>,
    alias: Option<String>,
}

impl SeriesBuilder {
    #[must_use]
    pub fn new(step: i64) -> Self {
        Self { step, labels: Vec::new(), samples: Vec::new(), bounds: None, alias: None }
    }

    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn point(mut self, ts: TimestampMs, value: f64) -> Self {
        self.samples.push(Sample::new(ts, value));
        self
    }

    #[must_use]
    pub fn points(mut self, points: impl IntoIterator<Item = (TimestampMs, f64)>) -> Self {
        self.samples.extend(points.into_iter().map(|(ts, v)| Sample::new(ts, v)));
        self
    }

    /// Append `count` points spaced by the step, starting at `start`.
    #[must_use]
    pub fn range(mut self, start: TimestampMs, count: usize, value: impl Fn(usize) -> f64) -> Self {
        let mut ts = start;
        for i in 0..count {
            self.samples.push(Sample::new(ts, value(i)));
            ts += self.step;
        }
        self
    }

    #[must_use]
    pub fn bounds(mut self, min: TimestampMs, max: TimestampMs) -> Self {
        self.bounds = Some((min, max));
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// # Errors
    ///
    /// Same conditions as [`TimeSeries::new`].
    pub fn build(self) -> Result<TimeSeries> {
        let (min, max) = self.bounds.unwrap_or_else(|| {
            (
                self.samples.first().map_or(0, |s| s.timestamp),
                self.samples.last().map_or(0, |s| s.timestamp),
            )
        });
        let labels = Labels::from_pairs(self.labels);
        TimeSeries::new(self.samples, labels, min, max, self.step, self.alias)
    }
}

/// Series with `values` at `start, start + step, ...`.
///
/// # Errors
///
/// Same conditions as [`TimeSeries::new`].
pub fn series_from_values(
    labels: &[(&str, &str)],
    start: TimestampMs,
    step: i64,
    values: &[f64],
) -> Result<TimeSeries> {
    let mut b = SeriesBuilder::new(step).range(start, values.len(), |i| values[i]);
    for (k, v) in labels {
        b = b.label(*k, *v);
    }
    b.build()
}

/// Single-label series `name=<value>` with one point, handy for order tests.
///
/// # Errors
///
/// Same conditions as [`TimeSeries::new`].
pub fn named_series(name: &str) -> Result<TimeSeries> {
    series_from_values(&[("name", name)], 0, 1, &[1.0])
}

/// Shard input carrying one unfold aggregation's series.
pub fn shard(shard_id: &str, aggregation: &str, series: Vec<TimeSeries>) -> ShardInput {
    ShardInput::new(shard_id).with_series(aggregation, series)
}
