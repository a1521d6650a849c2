//! Logical plan nodes built from parsed functions.
//!
//! Each `*_of` factory validates one [`FunctionNode`]'s arguments and assigns
//! the node a fresh id from the [`PlannerContext`]. Nodes link to their input
//! through `children`; in a linear pipeline every node has at most one child.

use super::context::{PlanNodeId, PlannerContext};
use crate::ast::{AstNode, FunctionNode, ValueNode};
use crate::error::{Error, Result};
use crate::stage::{ArithmeticOp, DEFAULT_HEAD_LIMIT};
use crate::summarizers::SummaryFunction;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq)]
pub enum PlanNodeKind {
    /// Series selection, resolved by storage.
    Fetch { query: String },
    Head { limit: usize },
    Summarize { interval: i64, function: SummaryFunction, align_to_from: bool },
    Scale { factor: f64 },
    ScaleToSeconds { seconds: f64 },
    Binary { op: ArithmeticOp, right_ref: String, labels: Vec<String>, keep_nans: bool },
    Union { right_ref: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlanNode {
    id: PlanNodeId,
    kind: PlanNodeKind,
    children: Vec<PlanNode>,
}

/// Walks plan nodes. [`PlanNode::accept`] hands the node to the visitor,
/// which decides whether and how to descend into children.
pub trait PlanVisitor {
    type Output;

    fn visit(&mut self, node: &PlanNode) -> Self::Output;
}

fn value_arg<'a>(arg: &'a AstNode, err: &str) -> Result<&'a ValueNode> {
    arg.as_value().ok_or_else(|| Error::invalid(err))
}

fn duration_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)(ms|s|m|h|d)?$").ok()).as_ref()
}

/// Parse `500ms`, `30s`, `1m`, `2h`, `1d` or bare milliseconds.
pub fn parse_duration_ms(s: &str) -> Result<i64> {
    let bad = || Error::invalid(format!("Invalid duration: {s}"));
    let caps = duration_pattern().and_then(|re| re.captures(s.trim())).ok_or_else(bad)?;
    let n: i64 = caps[1].parse().map_err(|_| bad())?;
    let unit = match caps.get(2).map(|m| m.as_str()) {
        None | Some("ms") => 1,
        Some("s") => 1_000,
        Some("m") => 60_000,
        Some("h") => 3_600_000,
        Some("d") => 86_400_000,
        Some(_) => return Err(bad()),
    };
    n.checked_mul(unit).ok_or_else(bad)
}

impl PlanNode {
    pub fn new(ctx: &PlannerContext, kind: PlanNodeKind) -> Self {
        Self { id: ctx.next_id(), kind, children: Vec::new() }
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn kind(&self) -> &PlanNodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[PlanNode] {
        &self.children
    }

    pub fn add_child(&mut self, child: PlanNode) {
        self.children.push(child);
    }

    pub fn accept<V: PlanVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit(self)
    }

    /// Label used by explain output, e.g. `HEAD(5)`.
    pub fn explain_name(&self) -> String {
        match &self.kind {
            PlanNodeKind::Fetch { query } => format!("FETCH({query})"),
            PlanNodeKind::Head { limit } => format!("HEAD({limit})"),
            PlanNodeKind::Summarize { interval, function, align_to_from } => {
                format!("SUMMARIZE({interval}, {function}, {align_to_from})")
            }
            PlanNodeKind::Scale { factor } => format!("SCALE({factor:.6})"),
            PlanNodeKind::ScaleToSeconds { seconds } => format!("SCALE_TO_SECONDS({seconds:.6})"),
            PlanNodeKind::Binary { op, right_ref, .. } => format!("BINARY({op}, {right_ref})"),
            PlanNodeKind::Union { right_ref } => format!("UNION({right_ref})"),
        }
    }

    /// Dispatch on the function name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown functions and whatever
    /// the matching factory rejects.
    pub fn of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        match f.name() {
            "fetch" => Self::fetch_of(ctx, f),
            "head" => Self::head_of(ctx, f),
            "summarize" => Self::summarize_of(ctx, f),
            "scale" => Self::scale_of(ctx, f),
            "scaleToSeconds" => Self::scale_to_seconds_of(ctx, f),
            "add" | "subtract" | "multiply" | "divide" => Self::binary_of(ctx, f),
            "union" => Self::union_of(ctx, f),
            other => Err(Error::invalid(format!("Unknown function: {other}"))),
        }
    }

    /// Build a linear pipeline: each function consumes the previous one's output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty pipeline or any
    /// rejected function.
    pub fn pipeline(ctx: &PlannerContext, functions: &[FunctionNode]) -> Result<Self> {
        let mut iter = functions.iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::invalid("Pipeline must contain at least one function"))?;
        let mut current = Self::of(ctx, first)?;
        for f in iter {
            let mut next = Self::of(ctx, f)?;
            next.add_child(current);
            current = next;
        }
        Ok(current)
    }

    /// `fetch <query...>`: every argument joined by spaces.
    pub fn fetch_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let parts = f
            .children()
            .iter()
            .map(|c| value_arg(c, "fetch arguments must be value nodes").map(ValueNode::value))
            .collect::<Result<Vec<_>>>()?;
        if parts.is_empty() {
            return Err(Error::invalid("fetch function requires a query"));
        }
        Ok(Self::new(ctx, PlanNodeKind::Fetch { query: parts.join(" ") }))
    }

    /// `head [limit]`, limit defaulting to 10.
    pub fn head_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let limit = match f.children() {
            [] => DEFAULT_HEAD_LIMIT,
            [arg] => {
                let raw = value_arg(arg, "head limit argument must be a numeric value")?.value();
                let not_integer =
                    || Error::invalid(format!("head limit must be a valid integer, got: {raw}"));
                // untrimmed 32-bit integer
                let n: i32 = raw.parse().map_err(|_| not_integer())?;
                if n <= 0 {
                    return Err(Error::invalid(format!("head limit must be positive, got: {n}")));
                }
                usize::try_from(n).map_err(|_| not_integer())?
            }
            _ => return Err(Error::invalid("head function accepts at most 1 argument: limit")),
        };
        Ok(Self::new(ctx, PlanNodeKind::Head { limit }))
    }

    /// `summarize <interval> [function] [alignToFrom]`.
    pub fn summarize_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let args = f
            .children()
            .iter()
            .map(|c| value_arg(c, "summarize arguments must be value nodes").map(ValueNode::value))
            .collect::<Result<Vec<_>>>()?;
        let (interval, function, align) = match args.as_slice() {
            [i] => (*i, "sum", "false"),
            [i, func] => (*i, *func, "false"),
            [i, func, a] => (*i, *func, *a),
            _ => {
                return Err(Error::invalid(
                    "summarize function expects between 1 and 3 arguments: \
                     interval, function, alignToFrom",
                ));
            }
        };
        let interval = parse_duration_ms(interval)?;
        if interval <= 0 {
            return Err(Error::invalid(format!(
                "summarize interval must be positive, got: {interval}"
            )));
        }
        let function = SummaryFunction::parse(function)?;
        let align_to_from = match align {
            "true" => true,
            "false" => false,
            other => {
                return Err(Error::invalid(format!(
                    "alignToFrom must be true or false, got: {other}"
                )));
            }
        };
        Ok(Self::new(ctx, PlanNodeKind::Summarize { interval, function, align_to_from }))
    }

    /// `scale <factor>`.
    pub fn scale_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let [arg] = f.children() else {
            return Err(Error::invalid("scale function expects exactly one argument"));
        };
        let raw = value_arg(arg, "Argument to scale function should be a value node")?.value();
        let factor: f64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::invalid(format!("scale factor must be a number, got: {raw}")))?;
        Ok(Self::new(ctx, PlanNodeKind::Scale { factor }))
    }

    /// `scaleToSeconds <seconds>`.
    pub fn scale_to_seconds_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let [arg] = f.children() else {
            return Err(Error::invalid("scaleToSeconds function expects exactly one argument"));
        };
        let raw =
            value_arg(arg, "Argument to scaleToSeconds function should be a value node")?.value();
        let seconds: f64 = raw.trim().parse().map_err(|_| {
            Error::invalid(format!("scaleToSeconds argument must be a number, got: {raw}"))
        })?;
        Ok(Self::new(ctx, PlanNodeKind::ScaleToSeconds { seconds }))
    }

    /// `add|subtract|multiply|divide <right_ref> [label...]`.
    pub fn binary_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let op = ArithmeticOp::parse(f.name())?;
        let err = format!("{} arguments must be value nodes", f.name());
        let mut args =
            f.children().iter().map(|c| value_arg(c, &err).map(|v| v.value().to_owned()));
        let right_ref = args.next().ok_or_else(|| {
            Error::invalid(format!("{} function requires a right operand reference", f.name()))
        })??;
        let labels = args.collect::<Result<Vec<_>>>()?;
        Ok(Self::new(ctx, PlanNodeKind::Binary { op, right_ref, labels, keep_nans: false }))
    }

    /// `union <right_ref>`.
    pub fn union_of(ctx: &PlannerContext, f: &FunctionNode) -> Result<Self> {
        let [arg] = f.children() else {
            return Err(Error::invalid("union function expects exactly one argument"));
        };
        let right_ref =
            value_arg(arg, "Argument to union function should be a value node")?.value().to_owned();
        Ok(Self::new(ctx, PlanNodeKind::Union { right_ref }))
    }
}
