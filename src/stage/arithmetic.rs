//! Binary arithmetic between two aggregations: `add`, `subtract`,
//! `multiply` and `divide`.

use super::binary::{BinaryProjection, LABELS_ARG, RIGHT_OP_REFERENCE_ARG};
use crate::error::{Error, Result};
use crate::series::{Sample, TimeSeries};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown operator names.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" | "sum" => Ok(Self::Add),
            "subtract" | "-" | "diff" => Ok(Self::Subtract),
            "multiply" | "*" => Ok(Self::Multiply),
            "divide" | "/" => Ok(Self::Divide),
            _ => Err(Error::invalid(format!("Unknown arithmetic operator: {s}"))),
        }
    }

    /// Division by zero yields NaN.
    #[inline]
    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            Self::Add => l + r,
            Self::Subtract => l - r,
            Self::Multiply => l * r,
            Self::Divide => {
                if r == 0.0 {
                    f64::NAN
                } else {
                    l / r
                }
            }
        }
    }
}

impl Display for ArithmeticOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let s = match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        };
        f.write_str(s)
    }
}

/// `left <op> right`, aligned on timestamp.
///
/// Several right series matching one left series are merged by summing values
/// at coincident timestamps. With `keep_nans`, a timestamp present on only one
/// side yields NaN instead of being dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArithmeticStage {
    op: ArithmeticOp,
    right_op_reference: String,
    labels: Vec<String>,
    keep_nans: bool,
}

impl ArithmeticStage {
    pub const NAME: &'static str = "arithmetic";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty reference.
    pub fn new(
        op: ArithmeticOp,
        right_op_reference: impl Into<String>,
        labels: Vec<String>,
        keep_nans: bool,
    ) -> Result<Self> {
        let stage = Self { op, right_op_reference: right_op_reference.into(), labels, keep_nans };
        stage.validate()?;
        Ok(stage)
    }

    pub fn op(&self) -> ArithmeticOp {
        self.op
    }

    pub fn right_op_reference(&self) -> &str {
        &self.right_op_reference
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.right_op_reference.is_empty() {
            return Err(Error::invalid(format!("{RIGHT_OP_REFERENCE_ARG} cannot be empty")));
        }
        Ok(())
    }

    /// Build from `op`, `right_op_reference`, optional `labels` and optional
    /// `keep_nans`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for missing or mistyped arguments.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        let op = match args.get("op") {
            Some(Value::String(s)) => ArithmeticOp::parse(s)?,
            _ => return Err(Error::invalid("op argument is required and must be a string")),
        };
        let reference = super::reference_arg(args)?;
        let not_strings = || Error::invalid(format!("{LABELS_ARG} must be a list of strings"));
        let labels = match args.get(LABELS_ARG) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned).ok_or_else(not_strings))
                .collect::<Result<_>>()?,
            Some(_) => return Err(not_strings()),
        };
        let keep_nans = match args.get("keep_nans") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(Error::invalid("keep_nans must be a boolean")),
        };
        Self::new(op, reference, labels, keep_nans)
    }

    pub fn to_explain(&self) -> Value {
        json!({
            "op": self.op.to_string(),
            "right_op_reference": self.right_op_reference,
            "labels": self.labels,
            "keep_nans": self.keep_nans,
        })
    }
}

impl BinaryProjection for ArithmeticStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn label_keys(&self) -> &[String] {
        &self.labels
    }

    fn keep_nans(&self) -> bool {
        self.keep_nans
    }

    fn process_samples(&self, left: Option<&Sample>, right: Option<&Sample>) -> Option<Sample> {
        match (left, right) {
            (Some(l), Some(r)) => Some(Sample::new(l.timestamp, self.op.apply(l.value, r.value))),
            (Some(only), None) | (None, Some(only)) => Some(Sample::new(only.timestamp, f64::NAN)),
            (None, None) => None,
        }
    }

    fn merge_matching_series(&self, matches: Vec<&TimeSeries>) -> Option<TimeSeries> {
        match matches.as_slice() {
            [] => None,
            [one] => Some((*one).clone()),
            [first, ..] => {
                let mut merged: BTreeMap<i64, f64> = BTreeMap::new();
                let mut min = first.min_timestamp();
                let mut max = first.max_timestamp();
                for series in &matches {
                    min = min.min(series.min_timestamp());
                    max = max.max(series.max_timestamp());
                    for s in series.samples() {
                        *merged.entry(s.timestamp).or_insert(0.0) += s.value;
                    }
                }
                let samples = merged.into_iter().map(|(ts, v)| Sample::new(ts, v)).collect();
                Some(TimeSeries::new_unchecked(
                    samples,
                    first.labels().clone(),
                    min,
                    max,
                    first.step(),
                    first.alias().map(str::to_owned),
                ))
            }
        }
    }
}
