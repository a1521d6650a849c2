//! Pipeline stages.
//!
//! A [`Stage`] is one transformation step over a list of series. Unary
//! stages map one list to another; binary stages combine a left list with a
//! right list supplied by another aggregation, named by their
//! `right_op_reference`.
//!
//! Stages declare where they may run:
//!
//! - **Shard-local** stages run on every shard against that shard's series.
//! - **Coordinator-only** stages (all binary stages) run once, after shard
//!   results are merged.
//! - **Global aggregations** (`head`) run on shards and are then reduced at
//!   the coordinator through [`Stage::reduce`].
//!
//! Every stage round-trips through [`Stage::write_to`] / [`Stage::read_from`]
//! so a compiled plan can be shipped to shards.

pub mod arithmetic;
pub mod binary;
pub mod head;
pub mod scale;
pub mod summarize;
pub mod union;

pub use arithmetic::{ArithmeticOp, ArithmeticStage};
pub use binary::{BinaryProjection, LABELS_ARG, RIGHT_OP_REFERENCE_ARG};
pub use head::{DEFAULT_HEAD_LIMIT, HeadStage};
pub use scale::{ScaleStage, ScaleToSecondsStage};
pub use summarize::SummarizeStage;
pub use union::UnionStage;

use crate::error::{Error, Result};
use crate::provider::TimeSeriesProvider;
use crate::series::TimeSeries;
use bincode::config::{BigEndian, Configuration, Fixint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use tracing::debug;

/// Fixed-width, big-endian integers on the wire.
fn wire_config() -> Configuration<BigEndian, Fixint> {
    bincode::config::standard().with_big_endian().with_fixed_int_encoding()
}

pub(crate) fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

pub(crate) fn reference_arg(args: &Map<String, Value>) -> Result<String> {
    match args.get(RIGHT_OP_REFERENCE_ARG) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(Error::invalid(format!(
            "{RIGHT_OP_REFERENCE_ARG} argument is required and must be a non-empty string"
        ))),
    }
}

/// Number of leading stages a shard runs.
///
/// The shard prefix stops before the first coordinator-only stage and right
/// after the first global aggregation, whose partials the coordinator then
/// reduces. Everything after the prefix runs on the coordinator.
pub fn shard_prefix_len(stages: &[Stage]) -> usize {
    for (i, stage) in stages.iter().enumerate() {
        if stage.is_coordinator_only() {
            return i;
        }
        if stage.is_global_aggregation() {
            return i + 1;
        }
    }
    stages.len()
}

/// Closed set of pipeline stages. Equality and hashing cover parameters only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Head(HeadStage),
    Summarize(SummarizeStage),
    Scale(ScaleStage),
    ScaleToSeconds(ScaleToSecondsStage),
    Arithmetic(ArithmeticStage),
    Union(UnionStage),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Head(_) => HeadStage::NAME,
            Self::Summarize(_) => SummarizeStage::NAME,
            Self::Scale(_) => ScaleStage::NAME,
            Self::ScaleToSeconds(_) => ScaleToSecondsStage::NAME,
            Self::Arithmetic(_) => ArithmeticStage::NAME,
            Self::Union(_) => UnionStage::NAME,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Arithmetic(_) | Self::Union(_))
    }

    /// Binary stages need both operands and therefore the merged view.
    pub fn is_coordinator_only(&self) -> bool {
        self.is_binary()
    }

    /// Stages whose shard outputs must be combined with [`Stage::reduce`].
    pub fn is_global_aggregation(&self) -> bool {
        matches!(self, Self::Head(_))
    }

    pub fn right_op_reference(&self) -> Option<&str> {
        match self {
            Self::Arithmetic(s) => Some(s.right_op_reference()),
            Self::Union(s) => Some(s.right_op_reference()),
            _ => None,
        }
    }

    /// Run a unary stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for binary stages and any error the
    /// stage itself raises.
    pub fn process(&self, input: Vec<TimeSeries>) -> Result<Vec<TimeSeries>> {
        let input_series = input.len();
        let out = match self {
            Self::Head(s) => s.process(input),
            Self::Summarize(s) => s.process(input)?,
            Self::Scale(s) => s.process(input),
            Self::ScaleToSeconds(s) => s.process(input),
            Self::Arithmetic(_) | Self::Union(_) => {
                return Err(Error::unsupported(format!(
                    "Binary pipeline stage '{}' requires two inputs",
                    self.name()
                )));
            }
        };
        debug!(stage = self.name(), input_series, output_series = out.len(), "stage processed");
        Ok(out)
    }

    /// Run a binary stage. `None` on either side is an absent operand, which
    /// is an error; an empty list is not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullInput`] for absent operands or
    /// [`Error::Unsupported`] for unary stages.
    pub fn process_binary(
        &self,
        left: Option<Vec<TimeSeries>>,
        right: Option<Vec<TimeSeries>>,
    ) -> Result<Vec<TimeSeries>> {
        let out = match self {
            Self::Arithmetic(s) => s.process(left, right)?,
            Self::Union(s) => s.process(left, right)?,
            _ => {
                return Err(Error::unsupported(format!(
                    "Pipeline stage '{}' is not a binary stage",
                    self.name()
                )));
            }
        };
        debug!(stage = self.name(), output_series = out.len(), "binary stage processed");
        Ok(out)
    }

    /// Combine per-shard partials of a global aggregation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty partial list and
    /// [`Error::Unsupported`] for stages that are not global aggregations.
    pub fn reduce(
        &self,
        partials: &[TimeSeriesProvider],
        is_final: bool,
    ) -> Result<TimeSeriesProvider> {
        match self {
            Self::Head(s) => {
                let reduced = s.reduce(partials)?;
                debug!(
                    stage = self.name(),
                    partials = partials.len(),
                    output_series = reduced.series().len(),
                    is_final,
                    "reduced partials"
                );
                Ok(reduced)
            }
            _ => Err(Error::unsupported(format!(
                "Pipeline stage '{}' does not support reduce",
                self.name()
            ))),
        }
    }

    /// Build a stage from its registered name and argument map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown names or bad arguments.
    pub fn from_args(name: &str, args: &Map<String, Value>) -> Result<Self> {
        Ok(match name {
            HeadStage::NAME => Self::Head(HeadStage::from_args(args)?),
            SummarizeStage::NAME => Self::Summarize(SummarizeStage::from_args(args)?),
            ScaleStage::NAME => Self::Scale(ScaleStage::from_args(args)?),
            ScaleToSecondsStage::NAME => {
                Self::ScaleToSeconds(ScaleToSecondsStage::from_args(args)?)
            }
            ArithmeticStage::NAME => Self::Arithmetic(ArithmeticStage::from_args(args)?),
            UnionStage::NAME => Self::Union(UnionStage::from_args(args)?),
            other => return Err(Error::invalid(format!("Unknown pipeline stage: {other}"))),
        })
    }

    /// Field-by-field parameter dump.
    pub fn to_explain(&self) -> Value {
        match self {
            Self::Head(s) => s.to_explain(),
            Self::Summarize(s) => s.to_explain(),
            Self::Scale(s) => s.to_explain(),
            Self::ScaleToSeconds(s) => s.to_explain(),
            Self::Arithmetic(s) => s.to_explain(),
            Self::Union(s) => s.to_explain(),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Head(s) => s.validate(),
            Self::Summarize(s) => s.validate(),
            Self::Scale(s) => s.validate(),
            Self::ScaleToSeconds(s) => s.validate(),
            Self::Arithmetic(s) => s.validate(),
            Self::Union(s) => s.validate(),
        }
    }

    /// Write the variant tag and every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding or the sink fails.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        bincode::serde::encode_into_std_write(self, sink, wire_config())?;
        Ok(())
    }

    /// Read a stage written by [`Stage::write_to`], re-checking parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for malformed input and
    /// [`Error::InvalidArgument`] for out-of-range parameters.
    pub fn read_from<R: Read>(source: &mut R) -> Result<Self> {
        let stage: Self = bincode::serde::decode_from_std_read(source, wire_config())?;
        stage.validate()?;
        Ok(stage)
    }

    /// Encode a whole stage list, length-prefixed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on encoding failure.
    pub fn write_all<W: Write>(stages: &[Stage], sink: &mut W) -> Result<()> {
        bincode::serde::encode_into_std_write(stages.len() as u64, &mut *sink, wire_config())?;
        for stage in stages {
            stage.write_to(sink)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Stage::read_from`].
    pub fn read_all<R: Read>(source: &mut R) -> Result<Vec<Stage>> {
        let n: u64 = bincode::serde::decode_from_std_read(&mut *source, wire_config())?;
        (0..n).map(|_| Self::read_from(source)).collect()
    }
}

impl From<HeadStage> for Stage {
    fn from(s: HeadStage) -> Self {
        Self::Head(s)
    }
}

impl From<SummarizeStage> for Stage {
    fn from(s: SummarizeStage) -> Self {
        Self::Summarize(s)
    }
}

impl From<ScaleStage> for Stage {
    fn from(s: ScaleStage) -> Self {
        Self::Scale(s)
    }
}

impl From<ScaleToSecondsStage> for Stage {
    fn from(s: ScaleToSecondsStage) -> Self {
        Self::ScaleToSeconds(s)
    }
}

impl From<ArithmeticStage> for Stage {
    fn from(s: ArithmeticStage) -> Self {
        Self::Arithmetic(s)
    }
}

impl From<UnionStage> for Stage {
    fn from(s: UnionStage) -> Self {
        Self::Union(s)
    }
}
