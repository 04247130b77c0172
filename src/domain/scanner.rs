// Structural scanner: the top-level driver producing the Program tree.

use log::debug;

use crate::domain::node::{Node, NodeKind, Relation};
use crate::domain::shapes::{find_functions, find_globals, FunctionShape};
use crate::domain::source::SourceText;
use crate::domain::statements::{declaration_node, parse_statements};

/// Build the node tree for `source`.
///
/// Never fails: unrecognized text is skipped and unterminated blocks are
/// closed at the end of the source. Top-level items are in source order.
pub fn build_tree(source: &str) -> Node {
    let src = SourceText::new(source);
    let functions = find_functions(&src);

    let mut items: Vec<Node> = functions.iter().map(|f| function_node(&src, f)).collect();
    items.extend(
        find_globals(&src, &functions)
            .iter()
            .map(|decl| declaration_node(&src, decl, Relation::Item)),
    );
    items.sort_by_key(|node| node.offset);

    debug!("[scan] built tree with {} top-level items", items.len());
    Node::program(items)
}

fn function_node(src: &SourceText, function: &FunctionShape) -> Node {
    let mut children: Vec<Node> = function
        .params
        .iter()
        .map(|param| {
            let declared_type = Some(param.declared_type.clone()).filter(|t| !t.is_empty());
            Node::new(NodeKind::Parameter, Relation::Param, param.offset, src.locate(param.offset))
                .with_name(param.name.as_str())
                .with_raw_text(declared_type)
        })
        .collect();

    children.push(
        Node::new(NodeKind::BlockStatement, Relation::Body, function.open, src.locate(function.open))
            .with_children(parse_statements(src, function.body.clone())),
    );

    Node::new(NodeKind::FunctionDeclaration, Relation::Item, function.start, src.locate(function.start))
        .with_name(function.name.as_str())
        .with_raw_text(Some(function.return_type.clone()))
        .with_children(children)
}
