//! Parsed query syntax handed to the planner.
//!
//! The parser itself lives outside this crate; these are just the node shapes
//! it produces. A pipeline such as `fetch name:cpu | head 5` arrives as one
//! [`FunctionNode`] per pipe segment, each holding its arguments.

/// A literal argument, kept as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueNode {
    value: String,
}

impl ValueNode {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AstNode {
    Function(FunctionNode),
    Value(ValueNode),
}

impl AstNode {
    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            Self::Value(v) => Some(v),
            Self::Function(_) => None,
        }
    }
}

/// A function call and its argument nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionNode {
    name: String,
    children: Vec<AstNode>,
}

impl FunctionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), children: Vec::new() }
    }

    /// Function with literal arguments only.
    pub fn with_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            children: values.into_iter().map(|v| AstNode::Value(ValueNode::new(v))).collect(),
        }
    }

    #[must_use]
    pub fn arg(mut self, child: AstNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }
}
