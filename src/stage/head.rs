//! `head`: keep the first N series.
//!
//! Runs on every shard and again at the coordinator, where the per-shard
//! partials are reduced to the first N series overall.

use crate::error::{Error, Result};
use crate::provider::TimeSeriesProvider;
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Limit used when none is given.
pub const DEFAULT_HEAD_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadStage {
    limit: usize,
}

impl Default for HeadStage {
    fn default() -> Self {
        Self { limit: DEFAULT_HEAD_LIMIT }
    }
}

impl HeadStage {
    pub const NAME: &'static str = "head";
    pub const LIMIT_ARG: &'static str = "limit";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `limit > 0`.
    pub fn new(limit: i64) -> Result<Self> {
        if limit <= 0 {
            return Err(Error::invalid(format!("Limit must be positive, got: {limit}")));
        }
        let limit = usize::try_from(limit)
            .map_err(|_| Error::invalid(format!("Limit out of range, got: {limit}")))?;
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::invalid("Limit must be positive, got: 0"));
        }
        Ok(())
    }

    pub fn process(&self, mut input: Vec<TimeSeries>) -> Vec<TimeSeries> {
        input.truncate(self.limit);
        input
    }

    /// Take series from the partials in the order given until `limit` is met.
    ///
    /// The result depends on partial order: with limit 3 and partials of two
    /// series each, the first partial contributes both and the second one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `partials` is empty.
    pub fn reduce(&self, partials: &[TimeSeriesProvider]) -> Result<TimeSeriesProvider> {
        let first = partials
            .first()
            .ok_or_else(|| Error::invalid("Aggregations list cannot be null or empty"))?;

        let available: usize = partials.iter().map(|p| p.series().len()).sum();
        let mut out = Vec::with_capacity(self.limit.min(available));
        for partial in partials {
            if out.len() >= self.limit {
                break;
            }
            let remaining = self.limit - out.len();
            out.extend(partial.series().iter().take(remaining).cloned());
        }
        Ok(first.create_reduced(out))
    }

    /// Build from an argument map. A missing or null `limit` means the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for non-numeric strings, values of
    /// any other JSON type, or a non-positive limit.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        let limit = match args.get(Self::LIMIT_ARG) {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => v,
                #[allow(clippy::cast_possible_truncation)]
                None => n.as_f64().map_or(0, |f| f as i64),
            },
            Some(Value::String(s)) => s.parse::<i32>().map(i64::from).map_err(|_| {
                Error::invalid(format!(
                    "Invalid type for '{}' argument. Expected integer, but got: {s}",
                    Self::LIMIT_ARG
                ))
            })?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "Invalid type for '{}' argument. Expected Number or String, but got {}",
                    Self::LIMIT_ARG,
                    super::json_type_name(other)
                )));
            }
        };
        Self::new(limit)
    }

    pub fn to_explain(&self) -> Value {
        json!({ "limit": self.limit })
    }
}
