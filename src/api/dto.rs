use serde::{Deserialize, Serialize};

use crate::domain::diagnostics::Diagnostic;
use crate::domain::language::Language;
use crate::domain::result::AnalysisResult;
use crate::domain::symbols::SymbolTable;
use crate::domain::syntax::SyntaxTree;
use crate::ports::OutputExporter;

/// Parameters of a COMPILE command.
#[derive(Debug, Default, Deserialize)]
pub struct CompileRequest {
    pub language: Option<String>,
    pub code: Option<String>,
}

impl CompileRequest {
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(Language::C.id())
    }
}

/// The response shape the visualization front end consumes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub output: String,
    pub errors: Vec<Diagnostic>,
    pub ast: Option<SyntaxTree>,
    pub symbol_table: SymbolTable,
}

impl From<AnalysisResult> for CompileResponse {
    fn from(result: AnalysisResult) -> Self {
        CompileResponse {
            output: result.execution_output.unwrap_or_default(),
            errors: result.diagnostics,
            ast: result.tree,
            symbol_table: result.symbols,
        }
    }
}

pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn render(&self, result: &AnalysisResult) -> String {
        let response = CompileResponse::from(result.clone());
        // Every field is plain data; serialization cannot fail.
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scanner::build_tree;
    use crate::domain::symbols::build_symbol_table;

    #[test]
    fn test_response_shape() {
        let src = "int x = 5; int main() { int y = x + 1; return y; }";
        let result = AnalysisResult {
            tree: Some(build_tree(src).into()),
            symbols: build_symbol_table(src),
            diagnostics: vec![Diagnostic::new(1, "warning: unused variable 'y'")],
            execution_output: None,
        };
        let json = serde_json::to_value(CompileResponse::from(result)).unwrap();

        assert_eq!(json["output"], "");
        assert_eq!(json["errors"][0]["line"], 1);
        assert_eq!(json["ast"]["kind"], "Program");
        assert_eq!(json["ast"]["children"][0]["kind"], "VariableDeclaration");
        assert_eq!(json["ast"]["children"][1]["relation"], "item");
        assert_eq!(json["symbolTable"]["y"]["scope"], "main");
        assert_eq!(json["symbolTable"]["main"]["params"], serde_json::json!([]));
    }

    #[test]
    fn test_request_defaults_to_c() {
        let request: CompileRequest = serde_json::from_str(r#"{"code": "int x;"}"#).unwrap();
        assert_eq!(request.language(), "c");
        assert_eq!(request.code.as_deref(), Some("int x;"));
    }

    #[test]
    fn test_json_exporter() {
        let rendered = JsonExporter.render(&AnalysisResult::default());
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(json["ast"].is_null());
        assert_eq!(json["symbolTable"], serde_json::json!({}));
    }
}
