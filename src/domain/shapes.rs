// Shape matchers shared by the structural scanner and the symbol table
// builder: function definitions, declarations and parameter lists.
//
// A shape is anchored at a statement start (see `block::statement_starts`)
// and matched against the masked source. Every offset returned here is an
// absolute offset into the source.

use std::ops::Range;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::block::{extract_block, find_top_level, skip_whitespace, split_top_level};
use crate::domain::block::{statement_starts, Boundaries};
use crate::domain::range::TextRange;
use crate::domain::source::SourceText;

/// Words that can never be a type word or a declared identifier.
const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "return", "break",
    "continue", "goto", "sizeof", "typedef",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn contains_keyword(words: &str) -> bool {
    words
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(is_keyword)
}

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ty>(?:[A-Za-z_]\w*[\s*]+)+)(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]\n]*\]\s*)*(?P<eq>=)?")
        .expect("declaration pattern")
});

static FUNCTION_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ty>(?:[A-Za-z_]\w*[\s*]+)+)(?P<name>[A-Za-z_]\w*)\s*\(")
        .expect("function pattern")
});

static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]]*\]\s*)*$").expect("parameter pattern")
});

/// `<type-words> <identifier> [= <expr>] ;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationShape {
    pub start: usize,
    pub declared_type: String,
    pub name: String,
    pub name_offset: usize,
    pub initializer: Option<Range<usize>>,
    /// Offset of the terminating `;`.
    pub end: usize,
}

/// One entry of a function's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamShape {
    pub name: String,
    pub declared_type: String,
    pub offset: usize,
}

/// `<type-words> <identifier> ( <params> ) { <body> }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionShape {
    pub start: usize,
    pub return_type: String,
    pub name: String,
    pub name_offset: usize,
    pub params: Vec<ParamShape>,
    /// Offset of the body's opening brace.
    pub open: usize,
    /// Offset of the body's closing brace; `None` when unterminated.
    pub close: Option<usize>,
    /// Text between the braces, running to the end of the source when
    /// the body is unterminated.
    pub body: Range<usize>,
}

impl FunctionShape {
    /// `[open, close]` of the body, the range used by containment tests.
    pub fn body_range(&self) -> TextRange {
        TextRange::new(self.open, self.close.unwrap_or(self.body.end))
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }
}

/// Match a declaration shape starting exactly at `at`, not reading past
/// `limit`.
pub fn match_declaration(src: &SourceText, at: usize, limit: usize) -> Option<DeclarationShape> {
    let masked = &src.masked()[..limit];
    let caps = DECLARATION.captures(&masked[at..])?;
    let ty = caps.name("ty")?;
    let name = caps.name("name")?;
    if contains_keyword(ty.as_str()) || is_keyword(name.as_str()) {
        return None;
    }

    let after = at + caps.get(0)?.end();
    let (initializer, end) = if caps.name("eq").is_some() {
        let end = find_top_level(masked, after, limit, b';')?;
        (Some(after..end), end)
    } else {
        let end = skip_whitespace(masked, after)?;
        if masked.as_bytes()[end] != b';' {
            return None;
        }
        (None, end)
    };

    Some(DeclarationShape {
        start: at,
        declared_type: ty.as_str().trim().to_string(),
        name: name.as_str().to_string(),
        name_offset: at + name.start(),
        initializer,
        end,
    })
}

/// Match a function definition shape starting exactly at `at`.
pub fn match_function(src: &SourceText, at: usize, limit: usize) -> Option<FunctionShape> {
    let masked = &src.masked()[..limit];
    let caps = FUNCTION_HEAD.captures(&masked[at..])?;
    let ty = caps.name("ty")?;
    let name = caps.name("name")?;
    if contains_keyword(ty.as_str()) || is_keyword(name.as_str()) {
        return None;
    }

    let paren_open = at + caps.get(0)?.end() - 1;
    let paren_close = extract_block(masked, paren_open).ok()?;
    let open = skip_whitespace(masked, paren_close + 1)?;
    if masked.as_bytes()[open] != b'{' {
        // Prototype or call, not a definition.
        return None;
    }

    let close = match extract_block(masked, open) {
        Ok(close) => Some(close),
        Err(e) => {
            debug!("[scan] function `{}`: {}", name.as_str(), e);
            None
        }
    };
    let body = open + 1..close.unwrap_or(limit);

    Some(FunctionShape {
        start: at,
        return_type: ty.as_str().trim().to_string(),
        name: name.as_str().to_string(),
        name_offset: at + name.start(),
        params: parse_params(src, paren_open + 1..paren_close),
        open,
        close,
        body,
    })
}

/// Split a parameter list on top-level commas. The last identifier of each
/// entry is its name and the text before it its type. `void` and `...`
/// entries declare nothing.
pub fn parse_params(src: &SourceText, list: Range<usize>) -> Vec<ParamShape> {
    let mut params = Vec::new();
    for (index, piece) in split_top_level(src.masked(), list, b',').into_iter().enumerate() {
        let piece = src.trimmed(piece);
        let text = &src.masked()[piece.clone()];
        if text.is_empty() || text == "void" || text == "..." {
            continue;
        }

        match PARAM_NAME.captures(text).and_then(|caps| caps.name("name")) {
            Some(name) => {
                let offset = piece.start + name.start();
                params.push(ParamShape {
                    name: name.as_str().to_string(),
                    declared_type: src.masked_fragment(piece.start..offset).to_string(),
                    offset,
                });
            }
            None => params.push(ParamShape {
                name: format!("param{}", index),
                declared_type: text.to_string(),
                offset: piece.start,
            }),
        }
    }
    params
}

/// Every function definition at the top level of the source.
pub fn find_functions(src: &SourceText) -> Vec<FunctionShape> {
    let limit = src.len();
    let functions: Vec<FunctionShape> = statement_starts(src.masked(), Boundaries::TopLevel)
        .into_iter()
        .filter_map(|at| match_function(src, at, limit))
        .collect();
    debug!("[scan] found {} function definitions", functions.len());
    functions
}

/// Every top-level declaration whose offset no function body contains.
pub fn find_globals(src: &SourceText, functions: &[FunctionShape]) -> Vec<DeclarationShape> {
    let limit = src.len();
    statement_starts(src.masked(), Boundaries::TopLevel)
        .into_iter()
        .filter_map(|at| match_declaration(src, at, limit))
        .filter(|decl| !functions.iter().any(|f| f.body_range().contains(decl.start)))
        .collect()
}
