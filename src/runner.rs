//! Two-phase query execution.
//!
//! 1. **Shard phase**: every shard runs, for each unfold aggregation, the
//!    stage prefix that may execute locally (see [`shard_prefix_len`]).
//!    Shards are independent and run on a Rayon pool in parallel mode.
//! 2. **Coordinator phase**: after all shards finish, partials are merged
//!    (reduced by the prefix's global aggregation, concatenated otherwise),
//!    the remaining stages run, and coordinator aggregations are evaluated in
//!    dependency order.
//!
//! Cancellation is cooperative and checked between stages.

use crate::aggregation::{AggregationDef, AggregationRegistry};
use crate::config::{ExecConfig, ExecMode};
use crate::error::Error;
use crate::provider::TimeSeriesProvider;
use crate::series::TimeSeries;
use crate::stage::{Stage, shard_prefix_len};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[cfg(feature = "profiling")]
use crate::profile::{
    DEFAULT_STAGES, ProfileReport, ProfileResult, ProfileShardResult, STAGES, TOTAL_INPUT_SERIES,
    TOTAL_OUTPUT_SERIES, TOTAL_SAMPLES, UNFOLD_AGGREGATION_TYPE,
};
#[cfg(feature = "profiling")]
use std::time::Instant;

/// One shard's fetched series, keyed by unfold aggregation name.
#[derive(Clone, Debug, Default)]
pub struct ShardInput {
    pub shard_id: String,
    pub series: HashMap<String, Vec<TimeSeries>>,
    /// Storage counters (chunk and doc counts) reported with the profile.
    pub storage_stats: Map<String, Value>,
}

impl ShardInput {
    pub fn new(shard_id: impl Into<String>) -> Self {
        Self { shard_id: shard_id.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_series(mut self, aggregation: impl Into<String>, series: Vec<TimeSeries>) -> Self {
        self.series.insert(aggregation.into(), series);
        self
    }

    #[must_use]
    pub fn with_storage_stat(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.storage_stats.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct QueryResult {
    pub final_name: String,
    /// Output of the final aggregation.
    pub series: Vec<TimeSeries>,
    /// Output of every registered aggregation.
    pub aggregations: BTreeMap<String, Vec<TimeSeries>>,
    #[cfg(feature = "profiling")]
    pub profile: Option<ProfileReport>,
}

struct ShardOutcome {
    partials: HashMap<String, TimeSeriesProvider>,
    #[cfg(feature = "profiling")]
    profile: ProfileShardResult,
}

pub struct QueryExecutor {
    config: ExecConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(ExecConfig::default())
    }
}

impl QueryExecutor {
    pub fn new(config: ExecConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Abort before the next stage once `flag` is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn execute(
        &self,
        registry: &AggregationRegistry,
        shards: &[ShardInput],
    ) -> Result<QueryResult> {
        self.config.validate()?;
        let final_name = registry.final_aggregation_name().context("resolving final aggregation")?;
        let order = registry.evaluation_order().context("ordering coordinator aggregations")?;
        let unfolds: Vec<&AggregationDef> = registry.unfold_defs().collect();

        debug!(
            shards = shards.len(),
            unfold_aggregations = unfolds.len(),
            coordinator_aggregations = order.len(),
            final_aggregation = %final_name,
            "executing query"
        );

        let outcomes = self.run_shards(&unfolds, shards)?;

        let mut results: BTreeMap<String, Vec<TimeSeries>> = BTreeMap::new();
        for def in &unfolds {
            let stages = def.stages();
            let prefix = shard_prefix_len(stages);
            let partials: Vec<TimeSeriesProvider> =
                outcomes.iter().filter_map(|o| o.partials.get(def.name()).cloned()).collect();
            let merged = merge_partials(&stages[..prefix], &partials)
                .with_context(|| format!("merging shard results of '{}'", def.name()))?;
            let out = self
                .apply_stages(def, &stages[prefix..], merged, &results)
                .with_context(|| format!("coordinator stages of '{}'", def.name()))?;
            results.insert(def.name().to_string(), out);
        }

        for def in order {
            let AggregationDef::Coordinator { input_reference, .. } = def else {
                continue;
            };
            let source = def.resolve(input_reference);
            let input = results
                .get(source)
                .cloned()
                .ok_or_else(|| Error::UnknownAggregation(source.to_string()))
                .with_context(|| format!("input of '{}'", def.name()))?;
            let out = self
                .apply_stages(def, def.stages(), input, &results)
                .with_context(|| format!("evaluating coordinator aggregation '{}'", def.name()))?;
            debug!(
                aggregation = def.name(),
                output_series = out.len(),
                "coordinator aggregation done"
            );
            results.insert(def.name().to_string(), out);
        }

        let series = results
            .get(&final_name)
            .cloned()
            .ok_or_else(|| anyhow!("final aggregation '{final_name}' produced no result"))?;

        #[cfg(feature = "profiling")]
        let profile = self.config.profile.then(|| {
            let shard_profiles: Vec<ProfileShardResult> =
                outcomes.into_iter().map(|o| o.profile).collect();
            ProfileReport::from_shards(&shard_profiles)
        });

        Ok(QueryResult {
            final_name,
            series,
            aggregations: results,
            #[cfg(feature = "profiling")]
            profile,
        })
    }

    fn run_shards(
        &self,
        unfolds: &[&AggregationDef],
        shards: &[ShardInput],
    ) -> Result<Vec<ShardOutcome>> {
        match self.config.mode {
            ExecMode::Sequential => shards.iter().map(|s| self.run_shard(unfolds, s)).collect(),
            ExecMode::Parallel { threads: None } => {
                shards.par_iter().map(|s| self.run_shard(unfolds, s)).collect()
            }
            ExecMode::Parallel { threads: Some(t) } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(t)
                    .build()
                    .context("building shard thread pool")?;
                pool.install(|| shards.par_iter().map(|s| self.run_shard(unfolds, s)).collect())
            }
        }
    }

    fn run_shard(&self, unfolds: &[&AggregationDef], shard: &ShardInput) -> Result<ShardOutcome> {
        let mut partials = HashMap::with_capacity(unfolds.len());
        #[cfg(feature = "profiling")]
        let mut profile =
            ProfileShardResult { shard_id: shard.shard_id.clone(), aggregations: Vec::new() };
        let no_results = BTreeMap::new();

        for def in unfolds {
            let stages = def.stages();
            let prefix = &stages[..shard_prefix_len(stages)];
            let input = shard.series.get(def.name()).cloned().unwrap_or_default();
            #[cfg(feature = "profiling")]
            let (started, input_series, input_samples) =
                (Instant::now(), input.len(), input.iter().map(TimeSeries::len).sum::<usize>());

            let out = self.apply_stages(def, prefix, input, &no_results).with_context(|| {
                format!("shard '{}' failed in aggregation '{}'", shard.shard_id, def.name())
            })?;
            debug!(
                shard_id = %shard.shard_id,
                aggregation = def.name(),
                output_series = out.len(),
                "shard phase done"
            );

            #[cfg(feature = "profiling")]
            if self.config.profile {
                profile.aggregations.push(shard_profile(
                    shard,
                    def.name(),
                    prefix,
                    (input_series, input_samples, out.len()),
                    started,
                ));
            }

            let provider = TimeSeriesProvider::new(def.name(), out)
                .with_metadata("shard_id", shard.shard_id.clone());
            partials.insert(def.name().to_string(), provider);
        }

        Ok(ShardOutcome {
            partials,
            #[cfg(feature = "profiling")]
            profile,
        })
    }

    fn check_cancelled(&self) -> crate::error::Result<()> {
        if self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Run `stages` in order. Binary stages read their right operand from
    /// `results`; an operand that was never produced is passed as absent.
    fn apply_stages(
        &self,
        def: &AggregationDef,
        stages: &[Stage],
        input: Vec<TimeSeries>,
        results: &BTreeMap<String, Vec<TimeSeries>>,
    ) -> crate::error::Result<Vec<TimeSeries>> {
        let mut current = input;
        for stage in stages {
            self.check_cancelled()?;
            current = match stage.right_op_reference() {
                Some(reference) => {
                    let right = results.get(def.resolve(reference)).cloned();
                    stage.process_binary(Some(current), right)?
                }
                None => stage.process(current)?,
            };
        }
        Ok(current)
    }
}

#[cfg(feature = "profiling")]
fn shard_profile(
    shard: &ShardInput,
    aggregation: &str,
    prefix: &[Stage],
    (input_series, input_samples, output_series): (usize, usize, usize),
    started: Instant,
) -> ProfileResult {
    let mut debug_map = shard.storage_stats.clone();
    let stage_names = if prefix.is_empty() {
        DEFAULT_STAGES.to_string()
    } else {
        prefix.iter().map(Stage::name).collect::<Vec<_>>().join(",")
    };
    debug_map.insert(STAGES.to_string(), Value::from(stage_names));
    debug_map.insert(TOTAL_INPUT_SERIES.to_string(), Value::from(input_series));
    debug_map.insert(TOTAL_OUTPUT_SERIES.to_string(), Value::from(output_series));
    debug_map.insert(TOTAL_SAMPLES.to_string(), Value::from(input_samples));
    ProfileResult {
        query_name: UNFOLD_AGGREGATION_TYPE.to_string(),
        description: aggregation.to_string(),
        time_nanos: u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX),
        debug: debug_map,
    }
}

/// Combine shard partials: reduce through a trailing global aggregation,
/// otherwise concatenate in shard order.
fn merge_partials(
    shard_stages: &[Stage],
    partials: &[TimeSeriesProvider],
) -> crate::error::Result<Vec<TimeSeries>> {
    if partials.is_empty() {
        return Ok(Vec::new());
    }
    match shard_stages.last() {
        Some(stage) if stage.is_global_aggregation() => {
            Ok(stage.reduce(partials, true)?.into_series())
        }
        _ => Ok(partials.iter().flat_map(|p| p.series().iter().cloned()).collect()),
    }
}
