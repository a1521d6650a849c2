//! Per-bucket summarization functions used by the summarize stage.
//!
//! A [`BucketSummarizer`] folds the values falling into one bucket into a
//! single output value. It is reset between buckets, so one instance serves a
//! whole series. [`SummaryFunction`] is the serializable descriptor that names
//! a summarizer and builds fresh instances of it.

pub mod basic;
pub mod quantiles;
pub mod statistical;

pub use basic::{AvgSummarizer, LastSummarizer, MaxSummarizer, MinSummarizer, SumSummarizer};
pub use quantiles::PercentileSummarizer;
pub use statistical::StdDevSummarizer;

use crate::error::{Error, Result};
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::OnceLock;

/// Stateful accumulator over the values of one bucket.
///
/// Calling [`finish`](BucketSummarizer::finish) without data is a contract
/// violation; implementations return NaN in that case.
pub trait BucketSummarizer: Send {
    /// Clear all state before the next bucket.
    fn reset(&mut self);

    fn accumulate(&mut self, value: f64);

    /// True once at least one value has been accumulated since the last reset.
    fn has_data(&self) -> bool;

    fn finish(&self) -> f64;
}

/// Serializable name of a summarization function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryFunction {
    Sum,
    Avg,
    Min,
    Max,
    Last,
    StdDev,
    /// Percentile in `0..=100`.
    Percentile(OrderedFloat<f64>),
}

fn percentile_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^p(\d+(?:\.\d+)?)$").ok()).as_ref()
}

impl SummaryFunction {
    /// Percentile descriptor, validated to `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `p` is outside that range.
    pub fn percentile(p: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::invalid(format!("Percentile must be between 0 and 100, got: {p}")));
        }
        Ok(Self::Percentile(OrderedFloat(p)))
    }

    /// Parse a function name such as `sum`, `avg`, `p99` or `p99.5`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "sum" => Ok(Self::Sum),
            "avg" | "mean" | "average" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "last" => Ok(Self::Last),
            "stddev" | "stdev" => Ok(Self::StdDev),
            "median" => Self::percentile(50.0),
            other => {
                let caps = percentile_pattern()
                    .and_then(|re| re.captures(other))
                    .ok_or_else(|| Error::invalid(format!("Unknown summarize function: {name}")))?;
                let p: f64 = caps[1]
                    .parse()
                    .map_err(|_| Error::invalid(format!("Unknown summarize function: {name}")))?;
                Self::percentile(p)
            }
        }
    }

    /// Fresh summarizer for one series.
    pub fn summarizer(&self) -> Box<dyn BucketSummarizer> {
        match *self {
            Self::Sum => Box::new(SumSummarizer::new()),
            Self::Avg => Box::new(AvgSummarizer::new()),
            Self::Min => Box::new(MinSummarizer::new()),
            Self::Max => Box::new(MaxSummarizer::new()),
            Self::Last => Box::new(LastSummarizer::new()),
            Self::StdDev => Box::new(StdDevSummarizer::new()),
            Self::Percentile(p) => Box::new(PercentileSummarizer::new(p.into_inner())),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Self::Percentile(p) = self {
            Self::percentile(p.into_inner())?;
        }
        Ok(())
    }
}

impl Display for SummaryFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Avg => write!(f, "avg"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
            Self::Last => write!(f, "last"),
            Self::StdDev => write!(f, "stddev"),
            Self::Percentile(p) => write!(f, "p{}", p.into_inner()),
        }
    }
}
