use crate::error::{Error, Result};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Concatenate the left series with the right series. Duplicates are kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionStage {
    right_op_reference: String,
}

impl UnionStage {
    pub const NAME: &'static str = "union";

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty reference.
    pub fn new(right_op_reference: impl Into<String>) -> Result<Self> {
        let stage = Self { right_op_reference: right_op_reference.into() };
        stage.validate()?;
        Ok(stage)
    }

    pub fn right_op_reference(&self) -> &str {
        &self.right_op_reference
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.right_op_reference.is_empty() {
            return Err(Error::invalid("right_op_reference cannot be empty"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::NullInput`] if either side is absent.
    pub fn process(
        &self,
        left: Option<Vec<TimeSeries>>,
        right: Option<Vec<TimeSeries>>,
    ) -> Result<Vec<TimeSeries>> {
        let null_input = |side: &str| {
            Error::NullInput(format!("{} stage received null {side} input", Self::NAME))
        };
        let mut left = left.ok_or_else(|| null_input("left"))?;
        let right = right.ok_or_else(|| null_input("right"))?;
        left.extend(right);
        Ok(left)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `right_op_reference` is missing.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        Self::new(super::reference_arg(args)?)
    }

    pub fn to_explain(&self) -> Value {
        json!({ "right_op_reference": self.right_op_reference })
    }
}
