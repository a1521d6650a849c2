//! Partial results exchanged between shards and the coordinator.

use crate::series::TimeSeries;
use serde_json::Value;
use std::collections::BTreeMap;

/// One aggregation's series list plus the metadata that travels with it.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesProvider {
    name: String,
    series: Vec<TimeSeries>,
    metadata: BTreeMap<String, Value>,
}

impl TimeSeriesProvider {
    pub fn new(name: impl Into<String>, series: Vec<TimeSeries>) -> Self {
        Self { name: name.into(), series, metadata: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    pub fn into_series(self) -> Vec<TimeSeries> {
        self.series
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// New provider holding `series`, keeping this one's name and metadata.
    pub fn create_reduced(&self, series: Vec<TimeSeries>) -> Self {
        Self { name: self.name.clone(), series, metadata: self.metadata.clone() }
    }
}
