// Trees handed to the presentation layer.
//
// The C pipeline builds its own simplified `Node` tree. Other languages
// keep the node vocabulary of the parser that produced them.

use serde::Serialize;

use crate::domain::node::{Location, Node};

/// Start and end of a node, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

/// A node of a parser-native tree. `kind` is the parser's own node type,
/// `field` the grammar field it fills in its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Source text of leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub loc: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Children paired with the label of the edge leading to them.
    pub fn labeled_children(&self) -> impl Iterator<Item = (&str, &SyntaxNode)> {
        self.children
            .iter()
            .map(|child| (child.field.as_deref().unwrap_or("child"), child))
    }

    pub fn child(&self, kind: &str) -> Option<&SyntaxNode> {
        self.children.iter().find(|child| child.kind == kind)
    }
}

/// Either tree flavor; serialized as the bare tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyntaxTree {
    Shape(Node),
    Native(SyntaxNode),
}

impl SyntaxTree {
    pub fn as_shape(&self) -> Option<&Node> {
        match self {
            SyntaxTree::Shape(node) => Some(node),
            SyntaxTree::Native(_) => None,
        }
    }

    pub fn as_native(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxTree::Native(node) => Some(node),
            SyntaxTree::Shape(_) => None,
        }
    }
}

impl From<Node> for SyntaxTree {
    fn from(node: Node) -> Self {
        SyntaxTree::Shape(node)
    }
}
