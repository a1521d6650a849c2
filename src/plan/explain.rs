//! Human-readable rendering of a compiled stage list.
//!
//! [`explain_stages`] annotates every stage with the phase it runs in and
//! whether the coordinator reduces it, and [`StagePlanExplanation`] prints
//! that as a boxed report.

use crate::stage::{Stage, shard_prefix_len};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Where a stage executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Shard,
    Coordinator,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Shard => write!(f, "SHARD"),
            Self::Coordinator => write!(f, "COORDINATOR"),
        }
    }
}

/// A single step in the stage plan.
#[derive(Debug, Clone)]
pub struct ExplainStep {
    /// Step number in the execution sequence.
    pub step: usize,
    /// Registered stage name.
    pub stage: String,
    /// Stage parameters as compact JSON.
    pub description: String,
    pub phase: Phase,
    /// Whether shard partials are reduced at the coordinator after this step.
    pub is_global: bool,
    /// Aggregation supplying the right operand, for binary stages.
    pub right_op_reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StagePlanExplanation {
    pub steps: Vec<ExplainStep>,
    /// Number of steps executed on shards.
    pub shard_steps: usize,
}

pub fn explain_stages(stages: &[Stage]) -> StagePlanExplanation {
    let shard_steps = shard_prefix_len(stages);
    let steps = stages
        .iter()
        .enumerate()
        .map(|(i, stage)| ExplainStep {
            step: i + 1,
            stage: stage.name().to_string(),
            description: stage.to_explain().to_string(),
            phase: if i < shard_steps { Phase::Shard } else { Phase::Coordinator },
            is_global: stage.is_global_aggregation(),
            right_op_reference: stage.right_op_reference().map(str::to_owned),
        })
        .collect();
    StagePlanExplanation { steps, shard_steps }
}

impl Display for StagePlanExplanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        writeln!(
            f,
            "╔═══════════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            f,
            "║                 STAGE PLAN EXPLANATION                        ║"
        )?;
        writeln!(
            f,
            "╚═══════════════════════════════════════════════════════════════╝"
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "┌─ SUMMARY ────────────────────────────────────────────────────┐"
        )?;
        writeln!(f, "│ Total Stages:      {:>10}", self.steps.len())?;
        writeln!(f, "│ Shard Stages:      {:>10}", self.shard_steps)?;
        writeln!(
            f,
            "│ Coordinator Stages:{:>10}",
            self.steps.len() - self.shard_steps
        )?;
        writeln!(
            f,
            "└──────────────────────────────────────────────────────────────┘"
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "┌─ EXECUTION STEPS ────────────────────────────────────────────┐"
        )?;
        for step in &self.steps {
            let global_marker = if step.is_global { " [GLOBAL]" } else { "" };
            writeln!(f, "│")?;
            writeln!(
                f,
                "│ Step {}: {} [{}]{}",
                step.step, step.stage, step.phase, global_marker
            )?;
            writeln!(f, "│   {}", step.description)?;
            if let Some(reference) = &step.right_op_reference {
                writeln!(f, "│   Right operand: {reference}")?;
            }
        }
        writeln!(f, "│")?;
        writeln!(
            f,
            "└──────────────────────────────────────────────────────────────┘"
        )
    }
}
