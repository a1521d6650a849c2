//! Plan node identifiers and the planning context that hands them out.
//!
//! Ids are sequential within one [`PlannerContext`]. A context lives for one
//! planning pass; nothing about it is global, so concurrent plans never share
//! a counter.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique numeric identifier for a node in one plan.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PlanNodeId(u64);

impl PlanNodeId {
    /// Return the underlying numeric value.
    ///
    /// Useful mainly for debugging or serialization.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for PlanNodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "#{}", self.0)
    }
}

/// Per-plan state shared by the node factories.
#[derive(Debug, Default)]
pub struct PlannerContext {
    next_id: AtomicU64,
}

impl PlannerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id, strictly greater than every id issued before by this context.
    pub fn next_id(&self) -> PlanNodeId {
        PlanNodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}
