//! Sample and series model.
//!
//! A [`TimeSeries`] is immutable once built: stages consume series and return
//! new ones. Samples are strictly ascending by timestamp and the declared
//! `[min_timestamp, max_timestamp]` range encloses all of them.

use crate::error::{Error, Result};
use crate::window::TimestampMs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// One timestamped value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: TimestampMs,
    pub value: f64,
}

impl Sample {
    #[inline]
    pub fn new(timestamp: TimestampMs, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Immutable label set. Equality ignores insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Copy of this set with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.insert(key.into(), value.into());
        Self(next)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Display for Labels {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

/// A labeled, time-ordered run of samples with its declared range and step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
    labels: Labels,
    min_timestamp: TimestampMs,
    max_timestamp: TimestampMs,
    step: i64,
    alias: Option<String>,
}

impl TimeSeries {
    /// Build a series, checking ordering and bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `step <= 0`, `min > max`, samples
    /// are not strictly ascending, or a sample falls outside `[min, max]`.
    pub fn new(
        samples: Vec<Sample>,
        labels: Labels,
        min_timestamp: TimestampMs,
        max_timestamp: TimestampMs,
        step: i64,
        alias: Option<String>,
    ) -> Result<Self> {
        if step <= 0 {
            return Err(Error::invalid(format!("Series step must be positive, got: {step}")));
        }
        if min_timestamp > max_timestamp {
            return Err(Error::invalid(format!(
                "Series min timestamp ({min_timestamp}) is after max timestamp ({max_timestamp})"
            )));
        }
        if samples.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(Error::invalid("Series samples must be strictly ascending by timestamp"));
        }
        if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
            if first.timestamp < min_timestamp || last.timestamp > max_timestamp {
                return Err(Error::invalid(format!(
                    "Series samples [{}, {}] fall outside declared range \
                     [{min_timestamp}, {max_timestamp}]",
                    first.timestamp, last.timestamp
                )));
            }
        }
        Ok(Self::new_unchecked(samples, labels, min_timestamp, max_timestamp, step, alias))
    }

    /// Build a series whose bounds are the first and last sample timestamps.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeSeries::new`].
    pub fn from_samples(samples: Vec<Sample>, labels: Labels, step: i64) -> Result<Self> {
        let min = samples.first().map_or(0, |s| s.timestamp);
        let max = samples.last().map_or(0, |s| s.timestamp);
        Self::new(samples, labels, min, max, step, None)
    }

    pub(crate) fn new_unchecked(
        samples: Vec<Sample>,
        labels: Labels,
        min_timestamp: TimestampMs,
        max_timestamp: TimestampMs,
        step: i64,
        alias: Option<String>,
    ) -> Self {
        Self { samples, labels, min_timestamp, max_timestamp, step, alias }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn min_timestamp(&self) -> TimestampMs {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> TimestampMs {
        self.max_timestamp
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Same metadata, new samples (caller keeps them inside the bounds).
    pub(crate) fn with_samples(&self, samples: Vec<Sample>) -> Self {
        Self { samples, ..self.clone_meta() }
    }

    fn clone_meta(&self) -> Self {
        Self {
            samples: Vec::new(),
            labels: self.labels.clone(),
            min_timestamp: self.min_timestamp,
            max_timestamp: self.max_timestamp,
            step: self.step,
            alias: self.alias.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
