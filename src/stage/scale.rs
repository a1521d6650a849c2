//! Per-series value scaling: `scale` and `scaleToSeconds`.

use crate::error::{Error, Result};
use crate::series::{Sample, TimeSeries};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

fn number_arg(args: &Map<String, Value>, key: &str) -> Result<f64> {
    match args.get(key) {
        None | Some(Value::Null) => Err(Error::invalid(format!("{key} argument is required"))),
        Some(Value::Number(n)) => {
            n.as_f64().ok_or_else(|| Error::invalid(format!("{key} must be a number")))
        }
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| Error::invalid(format!("{key} must be a number, got: {s}"))),
        Some(_) => Err(Error::invalid(format!("{key} must be a number"))),
    }
}

fn map_values(series: &TimeSeries, f: impl Fn(f64) -> f64) -> TimeSeries {
    let samples = series.samples().iter().map(|s| Sample::new(s.timestamp, f(s.value))).collect();
    series.with_samples(samples)
}

/* ===================== scale ===================== */

/// Multiply every value by a constant factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleStage {
    factor: OrderedFloat<f64>,
}

impl ScaleStage {
    pub const NAME: &'static str = "scale";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a non-finite factor.
    pub fn new(factor: f64) -> Result<Self> {
        let stage = Self { factor: OrderedFloat(factor) };
        stage.validate()?;
        Ok(stage)
    }

    pub fn factor(&self) -> f64 {
        self.factor.into_inner()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.factor.is_finite() {
            return Err(Error::invalid(format!(
                "Scale factor must be finite, got: {}",
                self.factor
            )));
        }
        Ok(())
    }

    pub fn process(&self, input: Vec<TimeSeries>) -> Vec<TimeSeries> {
        let factor = self.factor();
        input.iter().map(|s| map_values(s, |v| v * factor)).collect()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `factor` is missing or not numeric.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        Self::new(number_arg(args, "factor")?)
    }

    pub fn to_explain(&self) -> Value {
        json!({ "factor": self.factor() })
    }
}

/* ===================== scaleToSeconds ===================== */

/// Rescale per-step values into per-`seconds` values.
///
/// Each value is multiplied by `seconds * 1000 / step`, with `step` the
/// series resolution in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleToSecondsStage {
    seconds: OrderedFloat<f64>,
}

impl ScaleToSecondsStage {
    pub const NAME: &'static str = "scaleToSeconds";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `seconds` is finite and positive.
    pub fn new(seconds: f64) -> Result<Self> {
        let stage = Self { seconds: OrderedFloat(seconds) };
        stage.validate()?;
        Ok(stage)
    }

    pub fn seconds(&self) -> f64 {
        self.seconds.into_inner()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.seconds.is_finite() || self.seconds.into_inner() <= 0.0 {
            return Err(Error::invalid(format!("seconds must be positive, got: {}", self.seconds)));
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn process(&self, input: Vec<TimeSeries>) -> Vec<TimeSeries> {
        let millis = self.seconds() * 1000.0;
        input
            .iter()
            .map(|s| {
                let factor = millis / s.step() as f64;
                map_values(s, |v| v * factor)
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `seconds` is missing or not numeric.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        Self::new(number_arg(args, "seconds")?)
    }

    pub fn to_explain(&self) -> Value {
        json!({ "seconds": self.seconds() })
    }
}
