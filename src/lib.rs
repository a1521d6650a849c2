//! # Ironseries
//!
//! A **query pipeline execution core** for labeled time series. Queries are
//! compiled into lists of [`Stage`]s and executed in two phases: once on
//! every data shard, and once more at a coordinator that merges shard
//! results.
//!
//! ## Key Features
//!
//! - **Typed stage set** - head, summarize, scale, scaleToSeconds, arithmetic, union
//! - **Bucketed summarization** - sum, avg, min, max, last, stddev and exact percentiles
//! - **Binary projection** - timestamp-aligned merge join with label matching
//! - **Coordinator reduce** - global top-N across shards
//! - **Aggregation graph** - resolves the single final aggregation from references
//! - **Sequential and parallel execution** - shard phase on a Rayon pool
//! - **Profiling** - per-shard counters rolled into a JSON report (feature: `profiling`)
//!
//! ## Quick Start
//!
//! ```
//! use ironseries::*;
//! use ironseries::testing::{series_from_values, shard};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let mut registry = AggregationRegistry::new();
//! registry.register(AggregationDef::unfold("cpu", vec![HeadStage::new(1)?.into()]))?;
//!
//! let shards = vec![
//!     shard("0", "cpu", vec![series_from_values(&[("host", "a")], 0, 10, &[1.0, 2.0])?]),
//!     shard("1", "cpu", vec![series_from_values(&[("host", "b")], 0, 10, &[3.0])?]),
//! ];
//!
//! let result = QueryExecutor::new(ExecConfig::sequential()).execute(&registry, &shards)?;
//! assert_eq!(result.final_name, "cpu");
//! assert_eq!(result.series.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Planning
//!
//! Parsed functions ([`ast::FunctionNode`]) become [`plan::PlanNode`]s through
//! per-function factories that validate arguments. A linear plan lowers to
//! its stage list with [`plan::compile_stages`], and
//! [`plan::explain_stages`] shows which steps run where.
//!
//! ## Module Overview
//!
//! - [`series`] - samples, labels and series
//! - [`window`] - bucket arithmetic
//! - [`summarizers`] - per-bucket summarization functions
//! - [`stage`] - pipeline stages and their wire format
//! - [`plan`] - plan nodes, lowering and explain output
//! - [`aggregation`] - registered aggregations and final-aggregation resolution
//! - [`runner`] - two-phase executor
//! - [`profile`] - profile report (feature: `profiling`)
//! - [`testing`] - builders and assertions for tests

pub mod aggregation;
pub mod ast;
pub mod config;
pub mod error;
pub mod plan;
#[cfg(feature = "profiling")]
pub mod profile;
pub mod provider;
pub mod runner;
pub mod series;
pub mod stage;
pub mod summarizers;
pub mod testing;
pub mod window;

// General re-exports
pub use aggregation::{AggregationDef, AggregationRegistry};
pub use config::{ExecConfig, ExecMode};
pub use error::{Error, Result};
pub use provider::TimeSeriesProvider;
pub use runner::{QueryExecutor, QueryResult, ShardInput};
pub use series::{Labels, Sample, TimeSeries};
pub use stage::{
    ArithmeticOp, ArithmeticStage, BinaryProjection, HeadStage, ScaleStage, ScaleToSecondsStage,
    Stage, SummarizeStage, UnionStage,
};
pub use summarizers::{BucketSummarizer, SummaryFunction};
pub use window::{BucketMapper, TimestampMs, Window};

// Gated re-exports
#[cfg(feature = "profiling")]
pub use profile::ProfileReport;
