// Domain layer: the pattern-driven analyzer and the values it produces.

pub mod block;
pub mod diagnostics;
pub mod language;
pub mod locator;
pub mod node;
pub mod range;
pub mod result;
pub mod scanner;
pub mod shapes;
pub mod source;
pub mod statements;
pub mod symbols;
pub mod syntax;

pub use diagnostics::Diagnostic;
pub use language::Language;
pub use node::{Location, Node, NodeKind, Relation};
pub use result::AnalysisResult;
pub use scanner::build_tree;
pub use symbols::{build_symbol_table, Scope, SymbolEntry, SymbolKind, SymbolTable};
pub use syntax::{SyntaxNode, SyntaxTree};
