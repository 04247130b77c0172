use crate::domain::diagnostics::Diagnostic;
use crate::domain::language::Language;
use crate::domain::result::AnalysisResult;
use crate::domain::symbols::SymbolTable;
use crate::domain::syntax::SyntaxTree;

pub mod tree_exporter;

/// Builds the structural views of a source text. Never fails.
pub trait SourceAnalyzer: Send + Sync {
    fn language(&self) -> Language;

    /// `None` when the language has no tree view.
    fn build_tree(&self, source: &str) -> Option<SyntaxTree>;

    fn build_symbol_table(&self, source: &str) -> SymbolTable;

    /// Errors found while parsing. A source with syntax errors is not
    /// handed to the toolchain.
    fn syntax_errors(&self, _source: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// What an external toolchain reported for one source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Captured program output; `None` when the program never ran.
    pub output: Option<String>,
}

impl ExecutionReport {
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            output: None,
        }
    }
}

/// Compiles and runs a source text. Infallible: every failure becomes a
/// diagnostic so it cannot suppress the analyzer's output.
pub trait Toolchain: Send + Sync {
    fn execute(&self, source: &str) -> ExecutionReport;
}

pub trait OutputExporter {
    fn render(&self, result: &AnalysisResult) -> String;

    fn export(&self, result: &AnalysisResult, path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.render(result))
    }
}
