/// Scanner Verification Tests
/// Checks the node tree against whole-program scenarios.

use mini_compiler::domain::locator::locate;
use mini_compiler::domain::node::{Node, NodeKind, Relation};
use mini_compiler::domain::scanner::build_tree;

const PROGRAM: &str = r#"#include <stdio.h>

int counter = 0;

int square(int n) {
    return n * n;
}

int main(void) {
    int total = 0;
    for (int i = 0; i < 10; i++) {
        if (i % 2 == 0) {
            total = total + square(i);
        } else {
            printf("odd %d\n", i);
        }
    }
    while (total > 100) {
        total = total - 100;
    }
    return square(total);
}
"#;

fn function<'a>(tree: &'a Node, name: &str) -> &'a Node {
    tree.children
        .iter()
        .find(|c| c.kind == NodeKind::FunctionDeclaration && c.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("function {} not found", name))
}

#[test]
fn test_top_level_items_in_source_order() {
    let tree = build_tree(PROGRAM);
    let items: Vec<(NodeKind, &str)> = tree
        .children
        .iter()
        .map(|c| (c.kind, c.name.as_deref().unwrap_or("")))
        .collect();
    assert_eq!(
        items,
        vec![
            (NodeKind::VariableDeclaration, "counter"),
            (NodeKind::FunctionDeclaration, "square"),
            (NodeKind::FunctionDeclaration, "main"),
        ]
    );
    assert_eq!(tree.children[0].location.line, 3);
}

#[test]
fn test_main_body_statements() {
    let tree = build_tree(PROGRAM);
    let main = function(&tree, "main");
    assert!(main.children.iter().all(|c| c.kind != NodeKind::Parameter));

    let body = main.child(NodeKind::BlockStatement).unwrap();
    let kinds: Vec<NodeKind> = body.children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::VariableDeclaration,
            NodeKind::ForStatement,
            NodeKind::WhileStatement,
            NodeKind::ReturnStatement,
        ]
    );

    let ret = &body.children[3];
    let call = ret.child(NodeKind::CallExpression).unwrap();
    assert_eq!(call.name.as_deref(), Some("square"));
    assert_eq!(call.relation, Relation::Call);
    // The call under the return is not counted again as a statement.
    assert_eq!(body.find_all(NodeKind::CallExpression).len(), 2);
}

#[test]
fn test_loop_and_conditional_structure() {
    let tree = build_tree(PROGRAM);
    let body = function(&tree, "main").child(NodeKind::BlockStatement).unwrap();
    let for_loop = &body.children[1];

    let header: Vec<(&str, Option<&str>)> = for_loop
        .labeled_children()
        .filter(|(label, _)| matches!(*label, "init" | "test" | "update"))
        .map(|(label, node)| (label, node.raw_text.as_deref()))
        .collect();
    assert_eq!(
        header,
        vec![("init", Some("int i = 0")), ("test", Some("i < 10")), ("update", Some("i++"))]
    );

    let if_stmt = &for_loop.child(NodeKind::BlockStatement).unwrap().children[0];
    assert_eq!(if_stmt.kind, NodeKind::IfStatement);
    let labels: Vec<&str> = if_stmt.labeled_children().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["condition", "then", "else"]);

    let else_block = if_stmt.children.iter().find(|c| c.relation == Relation::Else).unwrap();
    let printf = &else_block.children[0];
    assert_eq!(printf.kind, NodeKind::CallExpression);
    assert_eq!(printf.name.as_deref(), Some("printf"));
    assert_eq!(printf.location, locate(PROGRAM, PROGRAM.find("printf").unwrap()));
}

#[test]
fn test_block_children_match_recognized_statements() {
    let src = "void f() { int a = 1; g(a); if (a) { h(); } return; }";
    let tree = build_tree(src);
    let body = function(&tree, "f").child(NodeKind::BlockStatement).unwrap();
    assert_eq!(body.children.len(), 4);
    assert_eq!(body.children[3].kind, NodeKind::ReturnStatement);
    assert_eq!(body.children[3].raw_text, None);
}

#[test]
fn test_locations_follow_line_count() {
    let tree = build_tree(PROGRAM);
    tree.walk(&mut |node| {
        if node.kind == NodeKind::Program {
            return;
        }
        assert!(node.offset < PROGRAM.len());
        let newlines = PROGRAM[..node.offset].matches('\n').count();
        assert_eq!(node.location.line, newlines + 1);
        assert_eq!(node.location, locate(PROGRAM, node.offset));
    });
}

#[test]
fn test_build_tree_is_idempotent() {
    assert_eq!(build_tree(PROGRAM), build_tree(PROGRAM));
}

#[test]
fn test_malformed_input_degrades() {
    for src in [
        "int f() {",
        "int f() { if (x) { return 1; ",
        "int f( { }",
        "int main() { for (;;) }",
        ")))(((",
        "int x = ;",
    ] {
        let tree = build_tree(src);
        assert_eq!(tree.kind, NodeKind::Program, "{}", src);
    }

    let tree = build_tree("int f() { int a = 1; if (a) { g();");
    let body = function(&tree, "f").child(NodeKind::BlockStatement).unwrap();
    assert_eq!(body.children[0].kind, NodeKind::VariableDeclaration);
}

#[test]
fn test_pathological_nesting_terminates() {
    let deep = format!("int f() {{ {}{} }}", "if (a) { ".repeat(5000), "}".repeat(5000));
    let tree = build_tree(&deep);
    assert_eq!(function(&tree, "f").kind, NodeKind::FunctionDeclaration);
    assert!(serde_json::to_string(&tree).is_ok());

    let started = std::time::Instant::now();
    let chain = format!("int g() {{ {} x(); }}", "if (a) ".repeat(40));
    let tree = build_tree(&chain);
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
    let body = function(&tree, "g").child(NodeKind::BlockStatement).unwrap();
    assert_eq!(body.children.len(), 1);
}
