// Node tree produced by the structural scanner.
// Fragments the scanner does not decompose stay opaque in `raw_text`.

use serde::Serialize;

/// Closed set of node tags understood by the visualization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Program,
    FunctionDeclaration,
    Parameter,
    VariableDeclaration,
    Initializer,
    BlockStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    ReturnStatement,
    CallExpression,
    Argument,
    Initialization,
    Test,
    Update,
    BinaryExpression,
}

/// How a node hangs off its parent. Rendered as the edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Root,
    Item,
    Param,
    Body,
    Statement,
    Initializer,
    Condition,
    Then,
    Else,
    Init,
    Test,
    Update,
    Argument,
    Call,
}

impl Relation {
    pub fn label(&self) -> &'static str {
        match self {
            Relation::Root => "root",
            Relation::Item => "item",
            Relation::Param => "param",
            Relation::Body => "body",
            Relation::Statement => "statement",
            Relation::Initializer => "initializer",
            Relation::Condition => "condition",
            Relation::Then => "then",
            Relation::Else => "else",
            Relation::Init => "init",
            Relation::Test => "test",
            Relation::Update => "update",
            Relation::Argument => "argument",
            Relation::Call => "call",
        }
    }
}

/// 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const START: Location = Location { line: 1, column: 0 };
}

/// A node in the simplified structural tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub kind: NodeKind,
    pub relation: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub location: Location,
    /// Byte offset in the analyzed source the node originates from.
    #[serde(skip)]
    pub offset: usize,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, relation: Relation, offset: usize, location: Location) -> Self {
        Self {
            kind,
            relation,
            name: None,
            raw_text: None,
            location,
            offset,
            children: Vec::new(),
        }
    }

    /// Root of every tree. Children are expected in source order.
    pub fn program(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(NodeKind::Program, Relation::Root, 0, Location::START)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_raw_text(mut self, raw_text: Option<String>) -> Self {
        self.raw_text = raw_text;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Children paired with the label of the edge leading to them.
    pub fn labeled_children(&self) -> impl Iterator<Item = (&'static str, &Node)> {
        self.children.iter().map(|child| (child.relation.label(), child))
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// All descendants (including self) of the given kind, in pre-order.
    pub fn find_all(&self, kind: NodeKind) -> Vec<&Node> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if node.kind == kind {
                found.push(node);
            }
        });
        found
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|child| child.kind == kind)
    }
}
