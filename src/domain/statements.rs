// Statement recognizer.
//
// A block is scanned by an ordered battery of independent shape matchers
// (declarations, conditionals, loops, returns, calls). Each matcher tries
// every statement start at depth 0 of the block; nested blocks are
// reached by recursion only, so no statement is reported twice. Results
// are merged back into source order.

use std::ops::Range;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::block::{extract_block, find_top_level, skip_whitespace, split_top_level};
use crate::domain::block::{statement_starts, Boundaries};
use crate::domain::node::{Node, NodeKind, Relation};
use crate::domain::shapes::{is_keyword, match_declaration, DeclarationShape};
use crate::domain::source::SourceText;

/// Deepest body the recognizer descends into. Bodies below it are kept as
/// empty `BlockStatement`s.
pub const MAX_NESTING: usize = 128;

static IF_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^if\s*\(").expect("if pattern"));
static ELSE_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^else\b").expect("else pattern"));
static FOR_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^for\s*\(").expect("for pattern"));
static WHILE_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^while\s*\(").expect("while pattern"));
static RETURN_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^return\b").expect("return pattern"));
static CALL_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[A-Za-z_]\w*)\s*\(").expect("call pattern"));
static CALL_IN_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<name>[A-Za-z_][\w.]*)\s*\(").expect("call pattern"));

/// Recognize the statements of the block spanning `block` (absolute
/// offsets, delimiters excluded).
pub fn parse_statements(src: &SourceText, block: Range<usize>) -> Vec<Node> {
    parse_block(src, block, 0)
}

fn parse_block(src: &SourceText, block: Range<usize>, depth: usize) -> Vec<Node> {
    let limit = block.end;
    let starts: Vec<usize> = statement_starts(&src.masked()[block.clone()], Boundaries::TopLevel)
        .into_iter()
        .map(|relative| block.start + relative)
        .collect();

    let mut nodes = Vec::new();

    for &at in &starts {
        if let Some(decl) = match_declaration(src, at, limit) {
            nodes.push(declaration_node(src, &decl, Relation::Statement));
        }
    }

    for &at in &starts {
        if let Some((node, _)) = match_if(src, at, limit, depth) {
            nodes.push(node);
        }
    }

    for &at in &starts {
        if let Some((node, _)) = match_for(src, at, limit, depth).or_else(|| match_while(src, at, limit, depth)) {
            nodes.push(node);
        }
    }

    // A call under a return never starts a statement of its own: the only
    // depth-0 start inside `return ... ;` is the keyword, which the call
    // shape rejects.
    for &at in &starts {
        if let Some(node) = match_return(src, at, limit) {
            nodes.push(node);
        }
    }

    for &at in &starts {
        if let Some(node) = match_call_statement(src, at, limit) {
            nodes.push(node);
        }
    }

    nodes.sort_by_key(|node| node.offset);
    nodes
}

/// `VariableDeclaration` with an optional `Initializer` child.
pub fn declaration_node(src: &SourceText, decl: &DeclarationShape, relation: Relation) -> Node {
    let mut node = Node::new(NodeKind::VariableDeclaration, relation, decl.start, src.locate(decl.start))
        .with_name(decl.name.as_str())
        .with_raw_text(Some(decl.declared_type.clone()));

    if let Some(init) = &decl.initializer {
        let offset = src.trimmed(init.clone()).start;
        node.push(
            Node::new(NodeKind::Initializer, Relation::Initializer, offset, src.locate(offset))
                .with_raw_text(src.fragment(init.clone())),
        );
    }
    node
}

/// Block or single-statement body starting at the first non-blank offset
/// after `from`. Returns the `BlockStatement` and the offset just past
/// the body. An unterminated block runs to `limit`.
fn match_body(src: &SourceText, from: usize, limit: usize, relation: Relation, depth: usize) -> Option<(Node, usize)> {
    let masked = &src.masked()[..limit];
    let at = skip_whitespace(masked, from)?;

    let (inner, end) = if masked.as_bytes()[at] == b'{' {
        match extract_block(masked, at) {
            Ok(close) => (at + 1..close, close + 1),
            Err(e) => {
                debug!("[scan] {}", e);
                (at + 1..limit, limit)
            }
        }
    } else {
        let end = statement_end(masked, at, limit, depth)?;
        (at..end, end)
    };

    let mut block = Node::new(NodeKind::BlockStatement, relation, at, src.locate(at));
    if depth >= MAX_NESTING {
        debug!("[scan] nesting deeper than {} at offset {}, body left empty", MAX_NESTING, at);
    } else {
        block = block.with_children(parse_block(src, inner, depth + 1));
    }
    Some((block, end))
}

/// Offset just past the single statement starting at `at`, found without
/// building nodes. A block runs to its matching brace (or `limit` when
/// unterminated); `if`, `for` and `while` heads extend over their body
/// and an `else` branch. Past `MAX_NESTING` heads, the next `;` ends it.
fn statement_end(masked: &str, at: usize, limit: usize, depth: usize) -> Option<usize> {
    if masked.as_bytes()[at] == b'{' {
        return Some(match extract_block(masked, at) {
            Ok(close) => close + 1,
            Err(e) => {
                debug!("[scan] {}", e);
                limit
            }
        });
    }

    let rest = &masked[at..];
    let is_if = IF_HEAD.is_match(rest);
    let head = if depth < MAX_NESTING {
        IF_HEAD.find(rest).or_else(|| FOR_HEAD.find(rest)).or_else(|| WHILE_HEAD.find(rest))
    } else {
        None
    };

    if let Some(head) = head {
        if let Ok(close) = extract_block(masked, at + head.end() - 1) {
            let body_at = skip_whitespace(masked, close + 1)?;
            let mut end = statement_end(masked, body_at, limit, depth + 1)?;
            if is_if {
                let alternate = skip_whitespace(masked, end).and_then(|else_at| {
                    let keyword = ELSE_HEAD.find(&masked[else_at..])?;
                    skip_whitespace(masked, else_at + keyword.end())
                });
                if let Some(alternate_at) = alternate {
                    end = statement_end(masked, alternate_at, limit, depth + 1)?;
                }
            }
            return Some(end);
        }
    }

    find_top_level(masked, at, limit, b';').map(|semi| semi + 1)
}

/// `if ( <expr> ) <then> [else <else>]`, with `else if` chains nested as
/// the alternate.
fn match_if(src: &SourceText, at: usize, limit: usize, depth: usize) -> Option<(Node, usize)> {
    let masked = &src.masked()[..limit];
    let head = IF_HEAD.find(&masked[at..])?;
    let open = at + head.end() - 1;
    let close = extract_block(masked, open).ok()?;

    let condition_offset = src.trimmed(open + 1..close).start;
    let condition = Node::new(
        NodeKind::BinaryExpression,
        Relation::Condition,
        condition_offset,
        src.locate(condition_offset),
    )
    .with_raw_text(src.fragment(open + 1..close));

    let mut node = Node::new(NodeKind::IfStatement, Relation::Statement, at, src.locate(at));
    node.push(condition);

    let Some((then_block, mut end)) = match_body(src, close + 1, limit, Relation::Then, depth) else {
        return Some((node, close + 1));
    };
    node.push(then_block);

    if let Some(else_at) = skip_whitespace(masked, end) {
        if let Some(keyword) = ELSE_HEAD.find(&masked[else_at..]) {
            let from = else_at + keyword.end();
            let alternate = skip_whitespace(masked, from)
                .filter(|_| depth < MAX_NESTING)
                .and_then(|nested_at| match_if(src, nested_at, limit, depth + 1))
                .map(|(mut nested, nested_end)| {
                    nested.relation = Relation::Else;
                    (nested, nested_end)
                })
                .or_else(|| match_body(src, from, limit, Relation::Else, depth));
            if let Some((alternate, alternate_end)) = alternate {
                node.push(alternate);
                end = alternate_end;
            }
        }
    }

    Some((node, end))
}

/// `for ( <init> ; <test> ; <update> ) <body>`
fn match_for(src: &SourceText, at: usize, limit: usize, depth: usize) -> Option<(Node, usize)> {
    let masked = &src.masked()[..limit];
    let head = FOR_HEAD.find(&masked[at..])?;
    let open = at + head.end() - 1;
    let close = extract_block(masked, open).ok()?;

    let clauses = split_top_level(masked, open + 1..close, b';');
    let shape = [
        (NodeKind::Initialization, Relation::Init),
        (NodeKind::Test, Relation::Test),
        (NodeKind::Update, Relation::Update),
    ];

    let mut node = Node::new(NodeKind::ForStatement, Relation::Statement, at, src.locate(at));
    for (i, (kind, relation)) in shape.into_iter().enumerate() {
        let clause = clauses.get(i).cloned().unwrap_or(close..close);
        let offset = src.trimmed(clause.clone()).start;
        node.push(Node::new(kind, relation, offset, src.locate(offset)).with_raw_text(src.fragment(clause)));
    }

    let end = match match_body(src, close + 1, limit, Relation::Body, depth) {
        Some((body, end)) => {
            node.push(body);
            end
        }
        None => close + 1,
    };
    Some((node, end))
}

/// `while ( <test> ) <body>`. A `while (...)` directly followed by `;`
/// closes a do-while and is not a loop of its own.
fn match_while(src: &SourceText, at: usize, limit: usize, depth: usize) -> Option<(Node, usize)> {
    let masked = &src.masked()[..limit];
    let head = WHILE_HEAD.find(&masked[at..])?;
    let open = at + head.end() - 1;
    let close = extract_block(masked, open).ok()?;
    if let Some(next) = skip_whitespace(masked, close + 1) {
        if masked.as_bytes()[next] == b';' {
            return None;
        }
    }

    let test_offset = src.trimmed(open + 1..close).start;
    let mut node = Node::new(NodeKind::WhileStatement, Relation::Statement, at, src.locate(at));
    node.push(
        Node::new(NodeKind::Test, Relation::Test, test_offset, src.locate(test_offset))
            .with_raw_text(src.fragment(open + 1..close)),
    );

    let end = match match_body(src, close + 1, limit, Relation::Body, depth) {
        Some((body, end)) => {
            node.push(body);
            end
        }
        None => close + 1,
    };
    Some((node, end))
}

/// `return [<expr>] ;`
fn match_return(src: &SourceText, at: usize, limit: usize) -> Option<Node> {
    let masked = &src.masked()[..limit];
    let head = RETURN_HEAD.find(&masked[at..])?;
    let expr_start = at + head.end();
    let semi = find_top_level(masked, expr_start, limit, b';')?;
    let expr = src.trimmed(expr_start..semi);

    let mut node = Node::new(NodeKind::ReturnStatement, Relation::Statement, at, src.locate(at))
        .with_raw_text(src.fragment(expr.clone()));
    if let Some(call) = find_call(src, expr) {
        node.push(call);
    }
    Some(node)
}

/// First call shape inside an expression.
fn find_call(src: &SourceText, expr: Range<usize>) -> Option<Node> {
    let masked = &src.masked()[..expr.end];
    for caps in CALL_IN_EXPR.captures_iter(&masked[expr.clone()]) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        if is_keyword(name.as_str()) {
            continue;
        }
        let open = expr.start + whole.end() - 1;
        if let Ok(close) = extract_block(masked, open) {
            return Some(call_node(src, name.as_str(), expr.start + name.start(), open, close, Relation::Call));
        }
    }
    None
}

/// `<identifier> ( <args> ) ;`
fn match_call_statement(src: &SourceText, at: usize, limit: usize) -> Option<Node> {
    let masked = &src.masked()[..limit];
    let caps = CALL_HEAD.captures(&masked[at..])?;
    let name = caps.name("name")?;
    if is_keyword(name.as_str()) {
        return None;
    }
    let open = at + caps.get(0)?.end() - 1;
    let close = extract_block(masked, open).ok()?;
    let semi = skip_whitespace(masked, close + 1)?;
    if masked.as_bytes()[semi] != b';' {
        return None;
    }
    Some(call_node(src, name.as_str(), at, open, close, Relation::Statement))
}

fn call_node(src: &SourceText, name: &str, offset: usize, open: usize, close: usize, relation: Relation) -> Node {
    let arguments = split_top_level(src.masked(), open + 1..close, b',')
        .into_iter()
        .filter_map(|piece| {
            let trimmed = src.trimmed(piece.clone());
            let raw_text = src.fragment(piece)?;
            Some(
                Node::new(NodeKind::Argument, Relation::Argument, trimmed.start, src.locate(trimmed.start))
                    .with_raw_text(Some(raw_text)),
            )
        })
        .collect();

    Node::new(NodeKind::CallExpression, relation, offset, src.locate(offset))
        .with_name(name)
        .with_children(arguments)
}
