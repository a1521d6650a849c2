//! Lowering of a linear plan into its stage list, source first.

use super::node::{PlanNode, PlanNodeKind, PlanVisitor};
use crate::error::{Error, Result};
use crate::stage::{
    ArithmeticStage, HeadStage, ScaleStage, ScaleToSecondsStage, Stage, SummarizeStage, UnionStage,
};

/// Visitor that emits stages in execution order: a node's input chain first,
/// then the node itself. Fetch nodes are sources and emit nothing.
#[derive(Debug, Default)]
pub struct StageCompiler {
    stages: Vec<Stage>,
}

impl StageCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_stages(self) -> Vec<Stage> {
        self.stages
    }

    fn lower(kind: &PlanNodeKind) -> Result<Option<Stage>> {
        let stage: Stage = match kind {
            PlanNodeKind::Fetch { .. } => return Ok(None),
            PlanNodeKind::Head { limit } => {
                let limit = i64::try_from(*limit)
                    .map_err(|_| Error::invalid(format!("Limit out of range, got: {limit}")))?;
                HeadStage::new(limit)?.into()
            }
            PlanNodeKind::Summarize { interval, function, align_to_from } => {
                SummarizeStage::new(*interval, *function, *align_to_from)?.into()
            }
            PlanNodeKind::Scale { factor } => ScaleStage::new(*factor)?.into(),
            PlanNodeKind::ScaleToSeconds { seconds } => ScaleToSecondsStage::new(*seconds)?.into(),
            PlanNodeKind::Binary { op, right_ref, labels, keep_nans } => {
                ArithmeticStage::new(*op, right_ref.clone(), labels.clone(), *keep_nans)?.into()
            }
            PlanNodeKind::Union { right_ref } => UnionStage::new(right_ref.clone())?.into(),
        };
        Ok(Some(stage))
    }
}

impl PlanVisitor for StageCompiler {
    type Output = Result<()>;

    fn visit(&mut self, node: &PlanNode) -> Result<()> {
        match node.children() {
            [] => {}
            [input] => input.accept(self)?,
            many => {
                return Err(Error::unsupported(format!(
                    "{} node {} has {} inputs; only linear pipelines compile to stages",
                    node.explain_name(),
                    node.id(),
                    many.len()
                )));
            }
        }
        if let Some(stage) = Self::lower(node.kind())? {
            self.stages.push(stage);
        }
        Ok(())
    }
}

/// Stage list for the pipeline ending at `root`.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] for branching plans and
/// [`Error::InvalidArgument`] for parameters a stage rejects.
pub fn compile_stages(root: &PlanNode) -> Result<Vec<Stage>> {
    let mut compiler = StageCompiler::new();
    root.accept(&mut compiler)?;
    Ok(compiler.into_stages())
}
