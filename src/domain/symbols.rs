//! Symbol Table Builder
//!
//! An independent pass over the raw source that registers functions,
//! parameters, globals and locals. Scope is inferred with a containment
//! test: a declaration belongs to the innermost function body whose
//! `[open, close]` range contains its offset.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::domain::block::{extract_block, skip_whitespace, statement_starts, Boundaries};
use crate::domain::range::{innermost_containing, TextRange};
use crate::domain::shapes::{find_functions, find_globals, match_declaration, FunctionShape};
use crate::domain::source::SourceText;

static FOR_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^for\s*\(").expect("for pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Parameter,
    Variable,
}

/// `"global"` or the name of the enclosing function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Function(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Global => "global",
            Scope::Function(name) => name,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Illustrative memory location shown next to a symbol.
///
/// This is NOT a real address or stack offset: it is derived from the
/// characters of the name alone so that the table has something stable to
/// display. Nothing may rely on it for layout or codegen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PseudoAddress(String);

impl PseudoAddress {
    pub fn for_symbol(name: &str, scope: &Scope) -> Self {
        let hash: u32 = name.chars().map(|c| c as u32).sum();
        if scope.is_global() {
            PseudoAddress(format!("0x{:X}", hash % 0xFFFF + 0x1000))
        } else {
            PseudoAddress(format!("SP+{}", hash % 128))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEntry {
    pub kind: SymbolKind,
    pub declared_type: String,
    pub scope: Scope,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    pub pseudo_address: PseudoAddress,
    /// Offset of the declared identifier.
    #[serde(skip)]
    pub offset: usize,
}

/// Symbols keyed by name. One entry per name; see `SymbolTable::register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolTable {
    entries: BTreeMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones, except that a function
    /// entry is never replaced by a parameter or a variable, so every
    /// non-global scope keeps naming a function of the table.
    pub fn register(&mut self, name: String, entry: SymbolEntry) {
        if let Some(existing) = self.entries.get(&name) {
            if existing.kind == SymbolKind::Function && entry.kind != SymbolKind::Function {
                debug!("[symbols] `{}` already names a function, keeping it", name);
                return;
            }
        }
        self.entries.insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Candidate {
    name: String,
    kind: SymbolKind,
    declared_type: String,
    scope: Scope,
    offset: usize,
    params: Option<Vec<String>>,
}

/// Build the symbol table for `source`. Candidates are registered in
/// source order of their identifiers.
pub fn build_symbol_table(source: &str) -> SymbolTable {
    let src = SourceText::new(source);
    let functions = find_functions(&src);
    let bodies: Vec<TextRange> = functions.iter().map(FunctionShape::body_range).collect();
    let scope_at = |offset: usize| match innermost_containing(&bodies, offset) {
        Some(i) => Scope::Function(functions[i].name.clone()),
        None => Scope::Global,
    };

    let mut candidates = Vec::new();

    for function in &functions {
        candidates.push(Candidate {
            name: function.name.clone(),
            kind: SymbolKind::Function,
            declared_type: function.return_type.clone(),
            scope: Scope::Global,
            offset: function.name_offset,
            params: Some(function.param_names()),
        });
        for param in &function.params {
            candidates.push(Candidate {
                name: param.name.clone(),
                kind: SymbolKind::Parameter,
                declared_type: param.declared_type.clone(),
                scope: Scope::Function(function.name.clone()),
                offset: param.offset,
                params: None,
            });
        }
    }

    for decl in find_globals(&src, &functions) {
        candidates.push(Candidate {
            name: decl.name,
            kind: SymbolKind::Variable,
            declared_type: decl.declared_type,
            scope: Scope::Global,
            offset: decl.name_offset,
            params: None,
        });
    }

    for function in &functions {
        for (name, declared_type, offset) in local_declarations(&src, function) {
            candidates.push(Candidate {
                name,
                kind: SymbolKind::Variable,
                declared_type,
                scope: scope_at(offset),
                offset,
                params: None,
            });
        }
    }

    candidates.sort_by_key(|c| c.offset);

    let mut table = SymbolTable::new();
    for candidate in candidates {
        let location = src.locate(candidate.offset);
        let entry = SymbolEntry {
            kind: candidate.kind,
            declared_type: candidate.declared_type,
            pseudo_address: PseudoAddress::for_symbol(&candidate.name, &candidate.scope),
            scope: candidate.scope,
            line: location.line,
            column: location.column,
            params: candidate.params,
            offset: candidate.offset,
        };
        table.register(candidate.name, entry);
    }

    debug!("[symbols] registered {} symbols", table.len());
    table
}

/// Declarations at any statement start inside a function body, plus the
/// declaration in the initialization clause of each `for` header.
fn local_declarations(src: &SourceText, function: &FunctionShape) -> Vec<(String, String, usize)> {
    let body = function.body.clone();
    let limit = body.end;
    let mut locals = Vec::new();

    for relative in statement_starts(&src.masked()[body.clone()], Boundaries::Nested) {
        let at = body.start + relative;
        if let Some(decl) = match_declaration(src, at, limit) {
            locals.push((decl.name, decl.declared_type, decl.name_offset));
            continue;
        }

        let Some(head) = FOR_HEAD.find(&src.masked()[at..limit]) else {
            continue;
        };
        let open = at + head.end() - 1;
        let Ok(close) = extract_block(&src.masked()[..limit], open) else {
            continue;
        };
        if let Some(init_start) = skip_whitespace(&src.masked()[..close], open + 1) {
            if let Some(decl) = match_declaration(src, init_start, close) {
                locals.push((decl.name, decl.declared_type, decl.name_offset));
            }
        }
    }
    locals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_function_symbols() {
        let table = build_symbol_table("int add(int a, int b) { return a + b; }");
        let add = table.get("add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.declared_type, "int");
        assert_eq!(add.params, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(add.scope.is_global());

        for name in ["a", "b"] {
            let param = table.get(name).unwrap();
            assert_eq!(param.kind, SymbolKind::Parameter);
            assert_eq!(param.scope, Scope::Function("add".to_string()));
            assert_eq!(param.declared_type, "int");
        }
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_global_main_local() {
        let table = build_symbol_table("int x = 5; int main() { int y = x + 1; return y; }");
        assert_eq!(table.get("x").unwrap().scope, Scope::Global);
        assert_eq!(table.get("main").unwrap().kind, SymbolKind::Function);
        assert_eq!(table.get("main").unwrap().scope, Scope::Global);
        assert_eq!(table.get("y").unwrap().scope, Scope::Function("main".to_string()));
    }

    #[test]
    fn test_nested_and_loop_locals() {
        let src = "void run(int n) {\n  for (int i = 0; i < n; i++) {\n    if (i) { double half = i / 2.0; }\n  }\n}";
        let table = build_symbol_table(src);
        let i = table.get("i").unwrap();
        assert_eq!(i.scope, Scope::Function("run".to_string()));
        assert_eq!((i.line, i.column), (2, 11));
        assert_eq!(table.get("half").unwrap().declared_type, "double");
    }

    #[test]
    fn test_function_is_not_displaced_by_variable() {
        let table = build_symbol_table("int f() { int f = 1; return f; }\nint g;\nint g = 2;");
        assert_eq!(table.get("f").unwrap().kind, SymbolKind::Function);
        // Later declaration wins.
        assert_eq!(table.get("g").unwrap().line, 3);
    }

    #[test]
    fn test_scope_display_honors_width() {
        assert_eq!(format!("{:<8}|", Scope::Global), "global  |");
        assert_eq!(format!("{:>6}|", Scope::Function("main".into())), "  main|");
    }

    #[test]
    fn test_pseudo_address_is_pure_function_of_name() {
        // 'x' = 120
        assert_eq!(PseudoAddress::for_symbol("x", &Scope::Global).as_str(), "0x1078");
        assert_eq!(PseudoAddress::for_symbol("x", &Scope::Function("main".into())).as_str(), "SP+120");
        // "ab" = 97 + 98 = 195, 195 % 128 = 67
        assert_eq!(PseudoAddress::for_symbol("ab", &Scope::Function("f".into())).as_str(), "SP+67");
    }

    #[test]
    fn test_serialized_row() {
        let table = build_symbol_table("long total;");
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["total"]["kind"], "variable");
        assert_eq!(json["total"]["declaredType"], "long");
        assert_eq!(json["total"]["scope"], "global");
        assert!(json["total"]["pseudoAddress"].as_str().unwrap().starts_with("0x"));
        assert!(json["total"].get("params").is_none());
    }
}
