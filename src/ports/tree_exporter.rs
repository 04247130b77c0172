//! Tree Exporters
//!
//! Renders an analysis result as a Graphviz DOT tree or as indented text.

use crate::domain::node::{Node, NodeKind};
use crate::domain::result::AnalysisResult;
use crate::domain::syntax::{SyntaxNode, SyntaxTree};
use crate::ports::OutputExporter;

pub struct DotExporter;

impl DotExporter {
    /// Convert a node tree to a DOT string. Edges carry the relation label.
    pub fn to_dot(tree: &Node) -> String {
        Self::digraph(|next_id, lines| Self::emit(tree, None, next_id, lines))
    }

    /// Same layout for a parser-native tree. Edges carry the grammar field.
    pub fn native_to_dot(tree: &SyntaxNode) -> String {
        Self::digraph(|next_id, lines| Self::emit_native(tree, None, next_id, lines))
    }

    fn digraph(body: impl FnOnce(&mut usize, &mut Vec<String>)) -> String {
        let mut lines = Vec::new();

        lines.push("digraph SyntaxTree {".to_string());
        lines.push("    rankdir=TB;".to_string());
        lines.push("    nodesep=0.6;".to_string());
        lines.push("    ranksep=0.8;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());

        let mut next_id = 0;
        body(&mut next_id, &mut lines);

        lines.push("}".to_string());
        lines.join("\n")
    }

    fn emit(node: &Node, parent: Option<(usize, &str)>, next_id: &mut usize, lines: &mut Vec<String>) {
        let id = *next_id;
        *next_id += 1;

        let (shape, color, style) = Self::node_style(node.kind);
        lines.push(format!(
            "    \"n{}\" [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\"];",
            id,
            Self::escape_label(&Self::label(node)),
            shape,
            style,
            color
        ));
        if let Some((parent_id, relation)) = parent {
            lines.push(format!("    \"n{}\" -> \"n{}\" [label=\"{}\"];", parent_id, id, relation));
        }

        for (relation, child) in node.labeled_children() {
            Self::emit(child, Some((id, relation)), next_id, lines);
        }
    }

    fn emit_native(node: &SyntaxNode, parent: Option<(usize, &str)>, next_id: &mut usize, lines: &mut Vec<String>) {
        let id = *next_id;
        *next_id += 1;

        let mut label = node.kind.clone();
        if let Some(text) = &node.text {
            label.push_str(&format!("\n{}", text));
        }
        let (shape, color, style) = if node.kind == "ERROR" {
            ("box", "#f38ba8", "filled")
        } else {
            ("ellipse", "#e6e9ef", "filled")
        };
        lines.push(format!(
            "    \"n{}\" [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\"];",
            id,
            Self::escape_label(&label),
            shape,
            style,
            color
        ));
        if let Some((parent_id, field)) = parent {
            lines.push(format!("    \"n{}\" -> \"n{}\" [label=\"{}\"];", parent_id, id, field));
        }

        for (field, child) in node.labeled_children() {
            Self::emit_native(child, Some((id, field)), next_id, lines);
        }
    }

    fn label(node: &Node) -> String {
        let mut label = format!("{:?}", node.kind);
        if let Some(name) = &node.name {
            label.push_str(&format!("\n{}", name));
        }
        if let Some(raw) = &node.raw_text {
            label.push_str(&format!("\n{}", raw));
        }
        label
    }

    fn node_style(kind: NodeKind) -> (&'static str, &'static str, &'static str) {
        match kind {
            NodeKind::Program => ("box", "#a6e3a1", "filled,rounded"),
            NodeKind::FunctionDeclaration => ("box", "#89b4fa", "filled"),
            NodeKind::IfStatement => ("diamond", "#f9e2af", "filled"),
            NodeKind::ForStatement | NodeKind::WhileStatement => ("hexagon", "#cba6f7", "filled"),
            NodeKind::ReturnStatement => ("box", "#f38ba8", "filled,rounded"),
            NodeKind::CallExpression => ("box", "#94e2d5", "filled"),
            NodeKind::BlockStatement => ("box", "#cdd6f4", "filled,dashed"),
            _ => ("ellipse", "#e6e9ef", "filled"),
        }
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl OutputExporter for DotExporter {
    fn render(&self, result: &AnalysisResult) -> String {
        match &result.tree {
            Some(SyntaxTree::Shape(tree)) => Self::to_dot(tree),
            Some(SyntaxTree::Native(tree)) => Self::native_to_dot(tree),
            None => "digraph SyntaxTree {\n}".to_string(),
        }
    }
}

/// Indented tree followed by the symbol table and diagnostics.
pub struct TextExporter;

impl TextExporter {
    pub fn tree_to_text(tree: &SyntaxTree) -> String {
        let mut out = String::new();
        match tree {
            SyntaxTree::Shape(node) => Self::write_node(node, "", 0, &mut out),
            SyntaxTree::Native(node) => Self::write_native(node, "", 0, &mut out),
        }
        out
    }

    fn write_native(node: &SyntaxNode, field: &str, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        if !field.is_empty() {
            out.push_str(field);
            out.push_str(": ");
        }
        out.push_str(&node.kind);
        if let Some(text) = &node.text {
            out.push_str(&format!(" [{}]", text.replace('\n', " ")));
        }
        out.push_str(&format!(" @{}:{}\n", node.loc.start.line, node.loc.start.column));

        for (label, child) in node.labeled_children() {
            Self::write_native(child, label, depth + 1, out);
        }
    }

    fn write_node(node: &Node, relation: &str, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        if !relation.is_empty() {
            out.push_str(relation);
            out.push_str(": ");
        }
        out.push_str(&format!("{:?}", node.kind));
        if let Some(name) = &node.name {
            out.push_str(&format!(" `{}`", name));
        }
        if let Some(raw) = &node.raw_text {
            out.push_str(&format!(" [{}]", raw.replace('\n', " ")));
        }
        out.push_str(&format!(" @{}:{}\n", node.location.line, node.location.column));

        for (label, child) in node.labeled_children() {
            Self::write_node(child, label, depth + 1, out);
        }
    }
}

impl OutputExporter for TextExporter {
    fn render(&self, result: &AnalysisResult) -> String {
        let mut out = String::new();
        if let Some(tree) = &result.tree {
            out.push_str(&Self::tree_to_text(tree));
            out.push('\n');
        }

        out.push_str("Symbols:\n");
        for (name, entry) in result.symbols.iter() {
            out.push_str(&format!(
                "  {:<16} {:<10} {:<16} {:<12} {}:{}  {}",
                name,
                format!("{:?}", entry.kind).to_lowercase(),
                entry.declared_type,
                entry.scope,
                entry.line,
                entry.column,
                entry.pseudo_address.as_str()
            ));
            if let Some(params) = &entry.params {
                out.push_str(&format!("  ({})", params.join(", ")));
            }
            out.push('\n');
        }

        if !result.diagnostics.is_empty() {
            out.push_str("\nDiagnostics:\n");
            for diagnostic in &result.diagnostics {
                out.push_str(&format!("  {}: {}\n", diagnostic.line, diagnostic.message));
            }
        }
        if let Some(output) = &result.execution_output {
            out.push_str("\nOutput:\n");
            out.push_str(output);
        }
        out
    }
}
