//! Query plan: nodes built from parsed functions, their ids, lowering to
//! stages, and explain output.

pub mod compile;
pub mod context;
pub mod explain;
pub mod node;

pub use compile::{StageCompiler, compile_stages};
pub use context::{PlanNodeId, PlannerContext};
pub use explain::{ExplainStep, Phase, StagePlanExplanation, explain_stages};
pub use node::{PlanNode, PlanNodeKind, PlanVisitor, parse_duration_ms};
