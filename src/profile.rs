//! Profile report built from per-shard execution statistics.
//!
//! Each shard reports one [`ProfileResult`] per aggregation it ran, with a
//! loose debug map of counters. Only unfold aggregations are counted. The
//! report sums their counters into totals and keeps a per-shard breakdown.
//!
//! Rendered shape:
//!
//! ```json
//! { "profile": {
//!     "totals": { "debug_info": { "total_chunks": 3, ... } },
//!     "shards": [ { "shard_id": "0",
//!                 "aggregations": [ { "debug_info": { "stages": "head", ... } } ] } ]
//! } }
//! ```

use serde_json::{Map, Value, json};

/// Query name under which unfold aggregations report.
pub const UNFOLD_AGGREGATION_TYPE: &str = "time_series_unfold";

pub const TOTAL_CHUNKS: &str = "total_chunks";
pub const TOTAL_SAMPLES: &str = "total_samples";
pub const TOTAL_INPUT_SERIES: &str = "total_input_series";
pub const TOTAL_OUTPUT_SERIES: &str = "total_output_series";
pub const LIVE_CHUNK_COUNT: &str = "live_chunk_count";
pub const CLOSED_CHUNK_COUNT: &str = "closed_chunk_count";
pub const LIVE_DOC_COUNT: &str = "live_doc_count";
pub const CLOSED_DOC_COUNT: &str = "closed_doc_count";
pub const LIVE_SAMPLE_COUNT: &str = "live_sample_count";
pub const CLOSED_SAMPLE_COUNT: &str = "closed_sample_count";
pub const STAGES: &str = "stages";
/// Stage label for an unfold aggregation that ran no stages.
pub const DEFAULT_STAGES: &str = "fetch_only";

/// In the order they are written; `serde_json` keeps insertion order.
const COUNTERS: [&str; 10] = [
    TOTAL_CHUNKS,
    TOTAL_SAMPLES,
    TOTAL_INPUT_SERIES,
    TOTAL_OUTPUT_SERIES,
    LIVE_CHUNK_COUNT,
    CLOSED_CHUNK_COUNT,
    LIVE_DOC_COUNT,
    CLOSED_DOC_COUNT,
    LIVE_SAMPLE_COUNT,
    CLOSED_SAMPLE_COUNT,
];

/// One aggregation's profile entry on one shard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileResult {
    pub query_name: String,
    pub description: String,
    pub time_nanos: u64,
    pub debug: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileShardResult {
    pub shard_id: String,
    pub aggregations: Vec<ProfileResult>,
}

/// Counters for one aggregation, or the totals across all of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub description: Option<String>,
    pub stages: Option<String>,
    pub total_time_nanos: u64,
    counters: [i64; COUNTERS.len()],
}

/// Integer value of `key`; absent or non-numeric counts as 0.
fn long_value(map: &Map<String, Value>, key: &str) -> i64 {
    match map.get(key) {
        #[allow(clippy::cast_possible_truncation)]
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    }
}

impl AggregationStats {
    pub fn get(&self, field: &str) -> i64 {
        COUNTERS.iter().position(|c| *c == field).map_or(0, |i| self.counters[i])
    }

    fn add(&mut self, other: &Self) {
        self.total_time_nanos = self.total_time_nanos.saturating_add(other.total_time_nanos);
        for (acc, v) in self.counters.iter_mut().zip(other.counters) {
            *acc = acc.saturating_add(v);
        }
    }

    fn debug_info(&self) -> Value {
        let mut map = Map::new();
        if let Some(stages) = self.stages.as_deref().filter(|s| !s.is_empty()) {
            map.insert(STAGES.to_string(), Value::from(stages));
        }
        for (name, v) in COUNTERS.iter().zip(self.counters) {
            map.insert((*name).to_string(), Value::from(v));
        }
        json!({ "debug_info": map })
    }

    /// Stats for one result, or `None` when it does not count.
    fn from_result(r: &ProfileResult) -> Option<Self> {
        if r.query_name != UNFOLD_AGGREGATION_TYPE || r.debug.is_empty() {
            return None;
        }
        let stages = match r.debug.get(STAGES) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => DEFAULT_STAGES.to_string(),
        };
        let mut counters = [0i64; COUNTERS.len()];
        for (slot, name) in counters.iter_mut().zip(COUNTERS) {
            *slot = long_value(&r.debug, name);
        }
        Some(Self {
            description: Some(r.description.clone()),
            stages: Some(stages),
            total_time_nanos: r.time_nanos,
            counters,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShardStats {
    pub shard_id: String,
    pub aggregations: Vec<AggregationStats>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileReport {
    pub totals: AggregationStats,
    /// Shards with at least one counted aggregation, in input order.
    pub shards: Vec<ShardStats>,
}

impl ProfileReport {
    pub fn from_shards(shards: &[ProfileShardResult]) -> Self {
        let mut report = Self::default();
        for shard in shards {
            let aggregations: Vec<AggregationStats> =
                shard.aggregations.iter().filter_map(AggregationStats::from_result).collect();
            for stats in &aggregations {
                report.totals.add(stats);
            }
            if !aggregations.is_empty() {
                report.shards.push(ShardStats { shard_id: shard.shard_id.clone(), aggregations });
            }
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn to_json(&self) -> Value {
        if self.is_empty() {
            return json!({ "profile": {} });
        }
        let shards: Vec<Value> = self
            .shards
            .iter()
            .map(|s| {
                let aggregations: Vec<Value> =
                    s.aggregations.iter().map(AggregationStats::debug_info).collect();
                json!({
                    "shard_id": s.shard_id,
                    "aggregations": aggregations,
                })
            })
            .collect();
        json!({
            "profile": {
                "totals": self.totals.debug_info(),
                "shards": shards,
            }
        })
    }
}
