//! Registered sub-aggregations of a query and their dependency graph.
//!
//! A query registers one or more **unfold** aggregations (fetch plus the
//! stages that start on shards) and any number of **coordinator**
//! aggregations that consume other aggregations by name. Coordinator
//! aggregations form a graph through their `references`; exactly one of them
//! must be referenced by nobody, and that one is the query's final result.

use crate::error::{Error, Result};
use crate::stage::Stage;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum AggregationDef {
    /// Fed by the shard fetch of the same name.
    Unfold { name: String, stages: Vec<Stage> },
    /// Runs at the coordinator over other aggregations' results.
    Coordinator {
        name: String,
        stages: Vec<Stage>,
        /// Role key to referenced aggregation name.
        references: BTreeMap<String, String>,
        /// Role key (or aggregation name) of the left input.
        input_reference: String,
    },
}

impl AggregationDef {
    pub fn unfold(name: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self::Unfold { name: name.into(), stages }
    }

    pub fn coordinator<I, K, V>(
        name: impl Into<String>,
        stages: Vec<Stage>,
        references: I,
        input_reference: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Coordinator {
            name: name.into(),
            stages,
            references: references.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            input_reference: input_reference.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unfold { name, .. } | Self::Coordinator { name, .. } => name,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        match self {
            Self::Unfold { stages, .. } | Self::Coordinator { stages, .. } => stages,
        }
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self, Self::Coordinator { .. })
    }

    /// Aggregation name behind `reference`: a role key if this definition
    /// declares it, otherwise the reference itself.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        match self {
            Self::Coordinator { references, .. } => {
                references.get(reference).map_or(reference, String::as_str)
            }
            Self::Unfold { .. } => reference,
        }
    }

    /// Every aggregation name this definition reads.
    fn dependencies(&self) -> BTreeSet<&str> {
        match self {
            Self::Unfold { .. } => BTreeSet::new(),
            Self::Coordinator { references, input_reference, stages, .. } => {
                let mut deps: BTreeSet<&str> = references.values().map(String::as_str).collect();
                deps.insert(self.resolve(input_reference));
                deps.extend(
                    stages
                        .iter()
                        .filter_map(Stage::right_op_reference)
                        .map(|r| self.resolve(r)),
                );
                deps
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AggregationRegistry {
    defs: Vec<AggregationDef>,
}

impl AggregationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a duplicate name or an unfold
    /// aggregation containing a binary stage.
    pub fn register(&mut self, def: AggregationDef) -> Result<()> {
        if self.get(def.name()).is_some() {
            return Err(Error::invalid(format!("Duplicate aggregation name: {}", def.name())));
        }
        if let AggregationDef::Unfold { name, stages } = &def {
            if let Some(stage) = stages.iter().find(|s| s.is_binary()) {
                return Err(Error::invalid(format!(
                    "Unfold aggregation '{name}' cannot contain binary stage '{}'",
                    stage.name()
                )));
            }
        }
        self.defs.push(def);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with(mut self, def: AggregationDef) -> Result<Self> {
        self.register(def)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&AggregationDef> {
        self.defs.iter().find(|d| d.name() == name)
    }

    pub fn defs(&self) -> &[AggregationDef] {
        &self.defs
    }

    pub fn unfold_defs(&self) -> impl Iterator<Item = &AggregationDef> {
        self.defs.iter().filter(|d| !d.is_coordinator())
    }

    pub fn coordinator_defs(&self) -> impl Iterator<Item = &AggregationDef> {
        self.defs.iter().filter(|d| d.is_coordinator())
    }

    /// Name of the aggregation whose output is the query result.
    ///
    /// With coordinator aggregations present, that is the one coordinator
    /// aggregation no other coordinator aggregation references. Without any,
    /// it is the single unfold aggregation.
    ///
    /// # Errors
    ///
    /// - [`Error::CircularDependency`] if every coordinator aggregation is referenced
    /// - [`Error::DisconnectedChains`] if several are unreferenced (names sorted)
    /// - [`Error::InvalidAggregationCount`] if there are no coordinator
    ///   aggregations and not exactly one unfold aggregation
    pub fn final_aggregation_name(&self) -> Result<String> {
        let coordinators: Vec<&AggregationDef> = self.coordinator_defs().collect();

        if coordinators.is_empty() {
            let unfolds: Vec<&AggregationDef> = self.unfold_defs().collect();
            return match unfolds.as_slice() {
                [only] => Ok(only.name().to_string()),
                other => Err(Error::InvalidAggregationCount { found: other.len() }),
            };
        }

        let referenced: HashSet<&str> = coordinators
            .iter()
            .filter_map(|d| match d {
                AggregationDef::Coordinator { references, .. } => {
                    Some(references.values().map(String::as_str))
                }
                AggregationDef::Unfold { .. } => None,
            })
            .flatten()
            .collect();

        let mut unreferenced: Vec<String> = coordinators
            .iter()
            .map(|d| d.name())
            .filter(|n| !referenced.contains(n))
            .map(str::to_owned)
            .collect();
        unreferenced.sort();

        match unreferenced.len() {
            1 => {
                let name = unreferenced.remove(0);
                debug!(final_aggregation = %name, "resolved final aggregation");
                Ok(name)
            }
            0 => Err(Error::CircularDependency(
                "There is a circular dependency in the pipeline aggregations".to_string(),
            )),
            _ => Err(Error::DisconnectedChains { names: unreferenced }),
        }
    }

    /// Coordinator aggregations ordered so each follows everything it reads.
    ///
    /// Ties are broken by name so the order is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAggregation`] for a dangling reference and
    /// [`Error::CircularDependency`] if coordinator aggregations form a cycle.
    pub fn evaluation_order(&self) -> Result<Vec<&AggregationDef>> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for def in self.coordinator_defs() {
            let mut deps = BTreeSet::new();
            for dep in def.dependencies() {
                match self.get(dep) {
                    None => return Err(Error::UnknownAggregation(dep.to_string())),
                    Some(d) if d.is_coordinator() => {
                        deps.insert(dep);
                    }
                    Some(_) => {}
                }
            }
            pending.insert(def.name(), deps);
        }

        let mut order = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().find(|(_, deps)| deps.is_empty()).map(|(name, _)| *name);
            let Some(name) = ready else {
                let stuck: Vec<&str> = pending.keys().copied().collect();
                return Err(Error::CircularDependency(format!(
                    "There is a circular dependency in the pipeline aggregations: [{}]",
                    stuck.join(", ")
                )));
            };
            pending.remove(name);
            for deps in pending.values_mut() {
                deps.remove(name);
            }
            if let Some(def) = self.get(name) {
                order.push(def);
            }
        }
        Ok(order)
    }
}
