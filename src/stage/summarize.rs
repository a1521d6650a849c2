//! `summarize`: downsample each series into fixed-width buckets.

use crate::error::{Error, Result};
use crate::series::{Sample, TimeSeries};
use crate::summarizers::SummaryFunction;
use crate::window::BucketMapper;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::trace;

/// Bucket each series by `interval` and summarize every bucket with
/// `function`.
///
/// With `align_to_from` unset, buckets sit on multiples of the interval.
/// With it set, the first bucket starts at the series' min timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummarizeStage {
    interval: i64,
    function: SummaryFunction,
    align_to_from: bool,
}

impl SummarizeStage {
    pub const NAME: &'static str = "summarize";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `interval > 0`.
    pub fn new(interval: i64, function: SummaryFunction, align_to_from: bool) -> Result<Self> {
        let stage = Self { interval, function, align_to_from };
        stage.validate()?;
        Ok(stage)
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn function(&self) -> SummaryFunction {
        self.function
    }

    pub fn align_to_from(&self) -> bool {
        self.align_to_from
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.interval <= 0 {
            return Err(Error::invalid(format!(
                "Interval must be positive, got: {}",
                self.interval
            )));
        }
        self.function.validate()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if any non-empty series has a step
    /// larger than the interval.
    pub fn process(&self, input: Vec<TimeSeries>) -> Result<Vec<TimeSeries>> {
        input.into_iter().map(|s| self.process_series(s)).collect()
    }

    fn process_series(&self, series: TimeSeries) -> Result<TimeSeries> {
        if series.is_empty() {
            return Ok(series);
        }
        if self.interval < series.step() {
            return Err(Error::invalid(format!(
                "Summarize interval ({}) must be >= series resolution ({})",
                self.interval,
                series.step()
            )));
        }

        let min = series.min_timestamp();
        let max = series.max_timestamp();
        let mapper = if self.align_to_from {
            BucketMapper::aligned(self.interval, min)
        } else {
            BucketMapper::fixed(self.interval)
        };

        let overflow = || {
            Error::invalid(format!(
                "Summarize buckets for range [{min}, {max}] with interval {} \
                 overflow the timestamp range",
                self.interval
            ))
        };
        let bucket_start = mapper.checked_bucket_start(min).ok_or_else(overflow)?;
        // exclusive and aligned, so the division is exact
        let bucket_end = mapper.checked_bucket_end(max).ok_or_else(overflow)?;
        let span = bucket_end.checked_sub(bucket_start).ok_or_else(overflow)?;
        let num_buckets = span / self.interval;

        let samples = series.samples();
        let mut out = Vec::new();
        let mut summarizer = self.function.summarizer();
        let mut cursor = 0usize;
        let mut current_start = bucket_start;

        for _ in 0..num_buckets {
            let current_end = current_start + self.interval;
            summarizer.reset();

            while let Some(sample) = samples.get(cursor) {
                if sample.timestamp >= current_end {
                    break;
                }
                if sample.timestamp >= current_start {
                    summarizer.accumulate(sample.value);
                }
                cursor += 1;
            }

            if summarizer.has_data() {
                out.push(Sample::new(current_start, summarizer.finish()));
            }
            current_start = current_end;
        }

        trace!(
            buckets = num_buckets,
            input_samples = samples.len(),
            output_samples = out.len(),
            "summarized series"
        );

        Ok(TimeSeries::new_unchecked(
            out,
            series.labels().clone(),
            mapper.map_to_bucket(min),
            mapper.map_to_bucket(max),
            self.interval,
            series.alias().map(str::to_owned),
        ))
    }

    /// Build from `interval` (integer, required), `function` (string,
    /// required) and `alignToFrom` (bool, optional).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for missing or mistyped arguments.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        let interval = match args.get("interval") {
            None | Some(Value::Null) => return Err(Error::invalid("interval argument is required")),
            Some(v) => v.as_i64().ok_or_else(|| Error::invalid("interval must be a number"))?,
        };
        let function = match args.get("function") {
            None => return Err(Error::invalid("function argument is required")),
            Some(Value::String(s)) => SummaryFunction::parse(s)?,
            Some(_) => return Err(Error::invalid("function must be a string")),
        };
        let align_to_from = match args.get("alignToFrom") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(Error::invalid("alignToFrom must be a boolean")),
        };
        Self::new(interval, function, align_to_from)
    }

    pub fn to_explain(&self) -> Value {
        json!({
            "interval": self.interval,
            "function": self.function.to_string(),
            "alignToFrom": self.align_to_from,
        })
    }
}
