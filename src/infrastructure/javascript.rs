/// Second language pipeline.
///
/// Parsing is delegated to the tree-sitter JavaScript grammar. The tree is
/// handed out in the grammar's own vocabulary; the symbol table lists the
/// top-level declarations only, all scoped `global`. Scripts run under
/// node's permission model, with read access to the script alone.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node as TsNode, Parser, Point, Tree};

use super::config::ToolchainConfig;
use super::gcc::{describe_status, not_found, scratch_dir};
use super::process::{run_with_timeout, CommandSpec, ProcessOutcome};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::language::Language;
use crate::domain::node::Location;
use crate::domain::symbols::{PseudoAddress, Scope, SymbolEntry, SymbolKind, SymbolTable};
use crate::domain::syntax::{Span, SyntaxNode, SyntaxTree};
use crate::ports::{ExecutionReport, SourceAnalyzer, Toolchain};

/// Deepest level copied out of the parser's tree. Nodes at this depth are
/// kept without children.
pub const MAX_TREE_DEPTH: usize = 256;

/// `<path>:<line>` header node prints above a syntax or runtime error.
static NODE_ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)main\.js:(?P<line>\d+)").expect("node location pattern"));

static NODE_ERROR_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<message>(?:[A-Z]\w*)?Error(?: \[\w+\])?: .+?)\s*$").expect("node error pattern")
});

fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
        warn!("[js] grammar rejected by tree-sitter: {}", e);
        return None;
    }
    parser.parse(source, None)
}

/// 1-based line, 0-based character column.
fn location(source: &str, byte: usize, point: Point) -> Location {
    let line_start = byte.saturating_sub(point.column);
    let column = source
        .get(line_start..byte)
        .map_or(point.column, |prefix| prefix.chars().count());
    Location {
        line: point.row + 1,
        column,
    }
}

fn span(node: TsNode, source: &str) -> Span {
    Span {
        start: location(source, node.start_byte(), node.start_position()),
        end: location(source, node.end_byte(), node.end_position()),
    }
}

fn text<'s>(node: TsNode, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// Named children with the grammar field each one fills.
fn named_children<'t>(node: TsNode<'t>) -> Vec<(TsNode<'t>, Option<&'static str>)> {
    let mut cursor = node.walk();
    let mut children = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                children.push((child, cursor.field_name()));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

/// Copy the parser's tree into owned nodes without recursing.
///
/// Nodes are laid out in pre-order, so every child sits after its parent.
/// Popping from the back therefore completes each node before it is
/// attached to its parent.
fn native_tree(root: TsNode, source: &str) -> Option<SyntaxNode> {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();
    let mut pending = vec![(root, None::<&'static str>, None::<usize>, 0usize)];

    while let Some((node, field, parent, depth)) = pending.pop() {
        let index = nodes.len();
        let children = if depth < MAX_TREE_DEPTH {
            named_children(node)
        } else {
            debug!(
                "[js] tree deeper than {} at line {}, children dropped",
                MAX_TREE_DEPTH,
                node.start_position().row + 1
            );
            Vec::new()
        };
        nodes.push(SyntaxNode {
            kind: node.kind().to_string(),
            field: field.map(str::to_string),
            text: (node.named_child_count() == 0).then(|| text(node, source).to_string()),
            loc: span(node, source),
            children: Vec::new(),
        });
        parents.push(parent);
        pending.extend(
            children
                .into_iter()
                .rev()
                .map(|(child, field)| (child, field, Some(index), depth + 1)),
        );
    }

    while let Some(mut node) = nodes.pop() {
        node.children.reverse();
        match parents.pop().flatten() {
            Some(parent) => nodes[parent].children.push(node),
            None => return Some(node),
        }
    }
    None
}

/// Identifiers a declaration pattern binds, in source order. Default
/// values and computed keys bind nothing.
fn bound_identifiers(pattern: TsNode) -> Vec<TsNode> {
    let mut found = Vec::new();
    let mut pending = vec![pattern];
    while let Some(node) = pending.pop() {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => found.push(node),
            "assignment_pattern" | "object_assignment_pattern" => {
                pending.extend(node.child_by_field_name("left"));
            }
            "pair_pattern" => pending.extend(node.child_by_field_name("value")),
            "formal_parameters" | "object_pattern" | "array_pattern" | "rest_pattern" => {
                pending.extend(named_children(node).into_iter().rev().map(|(child, _)| child));
            }
            _ => {}
        }
    }
    found
}

fn register(
    table: &mut SymbolTable,
    source: &str,
    name: TsNode,
    kind: SymbolKind,
    declared_type: &str,
    params: Option<Vec<String>>,
) {
    let identifier = text(name, source);
    let location = location(source, name.start_byte(), name.start_position());
    table.register(
        identifier.to_string(),
        SymbolEntry {
            kind,
            declared_type: declared_type.to_string(),
            scope: Scope::Global,
            line: location.line,
            column: location.column,
            params,
            pseudo_address: PseudoAddress::for_symbol(identifier, &Scope::Global),
            offset: name.start_byte(),
        },
    );
}

fn top_level_symbols(root: TsNode, source: &str) -> SymbolTable {
    let mut table = SymbolTable::new();

    for (item, _) in named_children(root) {
        let item = if item.kind() == "export_statement" {
            match item.child_by_field_name("declaration") {
                Some(declaration) => declaration,
                None => continue,
            }
        } else {
            item
        };

        match item.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let Some(name) = item.child_by_field_name("name") else {
                    continue;
                };
                let params = item
                    .child_by_field_name("parameters")
                    .map(|list| {
                        bound_identifiers(list)
                            .into_iter()
                            .map(|param| text(param, source).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                register(&mut table, source, name, SymbolKind::Function, "function", Some(params));
            }
            "lexical_declaration" | "variable_declaration" => {
                let keyword = text(item, source).split_whitespace().next().unwrap_or("var");
                for (declarator, _) in named_children(item) {
                    let Some(pattern) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    for name in bound_identifiers(pattern) {
                        register(&mut table, source, name, SymbolKind::Variable, keyword, None);
                    }
                }
            }
            _ => {}
        }
    }
    table
}

/// One `{line, message}` per error or missing node, in source order.
fn parse_errors(root: TsNode, source: &str) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        let line = node.start_position().row + 1;
        if node.is_error() {
            let token: String = text(node, source)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .chars()
                .take(24)
                .collect();
            errors.push(Diagnostic::new(line, format!("SyntaxError: Unexpected token '{}'", token)));
        } else if node.is_missing() {
            errors.push(Diagnostic::new(line, format!("SyntaxError: Missing '{}'", node.kind())));
        } else if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<TsNode> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }
    }
    errors
}

pub struct JsAnalyzer;

impl SourceAnalyzer for JsAnalyzer {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn build_tree(&self, source: &str) -> Option<SyntaxTree> {
        let tree = parse(source)?;
        native_tree(tree.root_node(), source).map(SyntaxTree::Native)
    }

    fn build_symbol_table(&self, source: &str) -> SymbolTable {
        let Some(tree) = parse(source) else {
            return SymbolTable::new();
        };
        let table = top_level_symbols(tree.root_node(), source);
        debug!("[js] registered {} top-level symbols", table.len());
        table
    }

    fn syntax_errors(&self, source: &str) -> Vec<Diagnostic> {
        match parse(source) {
            Some(tree) => parse_errors(tree.root_node(), source),
            None => vec![Diagnostic::general("JavaScript parser unavailable")],
        }
    }
}

/// Syntax-checks with `node --check`, then runs the script under node's
/// permission model with no grants beyond reading the script itself.
pub struct NodeToolchain {
    node: String,
    permission_flag: String,
    run_timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl NodeToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            node: config.node.clone(),
            permission_flag: config.node_permission_flag.clone(),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn check_spec(&self) -> CommandSpec {
        CommandSpec::new(self.node.as_str(), &["--check", Language::JavaScript.source_file()])
    }

    /// `script` must be absolute; node ignores relative grants.
    pub fn run_spec(&self, script: &Path) -> CommandSpec {
        let read_grant = format!("--allow-fs-read={}", script.display());
        CommandSpec::new(
            self.node.as_str(),
            &[self.permission_flag.as_str(), read_grant.as_str(), Language::JavaScript.source_file()],
        )
    }

    fn try_execute(&self, source: &str) -> Result<ExecutionReport> {
        let scratch = scratch_dir(self.temp_dir.as_deref())?;
        let dir = scratch.path();
        let script = dir.join(Language::JavaScript.source_file());
        std::fs::write(&script, source).context("Failed to write main.js")?;

        let mut check = self.check_spec().to_command(dir);
        let checked = match run_with_timeout(&mut check, dir, "check", self.run_timeout) {
            Ok(outcome) => outcome,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ExecutionReport::failed(vec![not_found(&self.node)]));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to execute {}", self.node)),
        };
        if !checked.success() {
            return Ok(ExecutionReport::failed(vec![translate_node_error(&checked.stderr)]));
        }

        let script = std::fs::canonicalize(&script).unwrap_or(script);
        let mut run = self.run_spec(&script).to_command(dir);
        // The script sees no host environment beyond the search path.
        run.env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            run.env("PATH", path);
        }
        let ran = run_with_timeout(&mut run, dir, "run", self.run_timeout).context("Failed to run the script")?;
        Ok(run_report(ran, self.run_timeout))
    }
}

/// Console output includes what the script wrote to stderr, unless that
/// text is the error being reported.
fn run_report(ran: ProcessOutcome, run_timeout: Duration) -> ExecutionReport {
    let succeeded = ran.success();
    let mut diagnostics = Vec::new();
    if ran.timed_out {
        diagnostics.push(Diagnostic::general(format!(
            "execution timed out after {}s",
            run_timeout.as_secs()
        )));
    } else if !succeeded {
        diagnostics.push(if ran.stderr.trim().is_empty() {
            Diagnostic::general(format!("script exited with {}", describe_status(ran.status)))
        } else {
            translate_node_error(&ran.stderr)
        });
    }

    let mut output = ran.stdout;
    if succeeded {
        output.push_str(&ran.stderr);
    }
    ExecutionReport {
        diagnostics,
        output: Some(output),
    }
}

impl Toolchain for NodeToolchain {
    fn execute(&self, source: &str) -> ExecutionReport {
        self.try_execute(source).unwrap_or_else(|e| {
            warn!("[node] toolchain failure: {:#}", e);
            ExecutionReport::failed(vec![Diagnostic::general(format!("{:#}", e))])
        })
    }
}

/// Turn node's error report into one `{line, message}` pair, falling back
/// to the raw text on line 0.
pub fn translate_node_error(stderr: &str) -> Diagnostic {
    let line = NODE_ERROR_LINE
        .captures(stderr)
        .and_then(|caps| caps.name("line")?.as_str().parse().ok());
    let message = NODE_ERROR_MESSAGE
        .captures(stderr)
        .and_then(|caps| caps.name("message"))
        .map(|m| m.as_str().to_string());

    match (line, message) {
        (Some(line), Some(message)) => Diagnostic::new(line, message),
        (None, Some(message)) => Diagnostic::general(message),
        _ => Diagnostic::general(stderr.trim()),
    }
}
