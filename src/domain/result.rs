use serde::Serialize;

use crate::domain::diagnostics::Diagnostic;
use crate::domain::symbols::SymbolTable;
use crate::domain::syntax::SyntaxTree;

/// Everything one compile request produces.
///
/// `tree` and `symbols` come from the analyzer and are present even when
/// the toolchain reports errors. `execution_output` is `None` when the
/// program was not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tree: Option<SyntaxTree>,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    pub execution_output: Option<String>,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.line == 0 || !d.message.starts_with("warning:"))
    }
}
