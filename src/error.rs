//! Error taxonomy for stage execution, plan building and aggregation resolution.
//!
//! Every fallible operation in the crate returns [`Result`]. The runner and
//! config layers wrap these in `anyhow` with context; the typed error stays
//! reachable through `downcast_ref::<Error>()`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A parameter or argument failed validation
    #[error("{0}")]
    InvalidArgument(String),

    /// An operation the stage or node does not implement
    #[error("{0}")]
    Unsupported(String),

    /// Every coordinator aggregation is referenced by another one
    #[error("{0}")]
    CircularDependency(String),

    /// More than one coordinator aggregation is unreferenced
    #[error(
        "Found multiple unreferenced pipeline aggregations: [{}]. \
         This indicates disconnected pipeline chains. \
         There should be exactly one final aggregation.",
        .names.join(", ")
    )]
    DisconnectedChains { names: Vec<String> },

    /// No coordinator aggregations and not exactly one unfold aggregation
    #[error(
        "Found {found} regular aggregations without pipeline aggregations. \
         Expected exactly one unfold aggregation."
    )]
    InvalidAggregationCount { found: usize },

    /// A required input list was absent (distinct from empty)
    #[error("{0}")]
    NullInput(String),

    /// A reference names no registered aggregation
    #[error("Unknown aggregation reference: {0}")]
    UnknownAggregation(String),

    /// Stage wire encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The query was cancelled between stages
    #[error("Query cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(e: bincode::error::EncodeError) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(e: bincode::error::DecodeError) -> Self {
        Self::Serialization(e.to_string())
    }
}
