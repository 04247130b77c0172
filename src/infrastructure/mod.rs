// Infrastructure implementations for the compile service.

use log::info;

use crate::application::{CompileService, LanguagePipeline};
use crate::domain::language::Language;
use crate::domain::scanner::build_tree;
use crate::domain::symbols::{build_symbol_table, SymbolTable};
use crate::domain::syntax::SyntaxTree;
use crate::ports::SourceAnalyzer;

pub mod concurrency;
pub mod config;
pub mod gcc;
pub mod javascript;
pub mod process;

use config::Config;
use gcc::GccToolchain;
use javascript::{JsAnalyzer, NodeToolchain};

/// Pattern-driven analyzer for C.
pub struct ShapeAnalyzer;

impl SourceAnalyzer for ShapeAnalyzer {
    fn language(&self) -> Language {
        Language::C
    }

    fn build_tree(&self, source: &str) -> Option<SyntaxTree> {
        Some(build_tree(source).into())
    }

    fn build_symbol_table(&self, source: &str) -> SymbolTable {
        build_symbol_table(source)
    }
}

/// Wire both language pipelines. With `execute` off no toolchain is
/// attached and results carry no diagnostics or output.
pub fn build_service(config: &Config, execute: bool) -> CompileService {
    info!(
        "[setup] C toolchain `{}`, node `{}`, execution {}",
        config.toolchain.c_compiler,
        config.toolchain.node,
        if execute { "enabled" } else { "disabled" }
    );
    CompileService::new()
        .with_pipeline(LanguagePipeline {
            analyzer: Box::new(ShapeAnalyzer),
            toolchain: if execute {
                Some(Box::new(GccToolchain::new(&config.toolchain)))
            } else {
                None
            },
        })
        .with_pipeline(LanguagePipeline {
            analyzer: Box::new(JsAnalyzer),
            toolchain: if execute {
                Some(Box::new(NodeToolchain::new(&config.toolchain)))
            } else {
                None
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_without_execution() {
        let service = build_service(&Config::default(), false);
        assert!(service.supports(Language::C));
        assert!(service.supports(Language::JavaScript));

        let result = service.compile(Language::C, Some("int x = 5;")).unwrap();
        assert!(result.tree.is_some());
        assert!(result.symbols.get("x").is_some());
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.execution_output, None);

        let js = service.compile_request("javascript", Some("let y = 1;")).unwrap();
        assert_eq!(js.tree.as_ref().and_then(|t| t.as_native()).map(|n| n.kind.as_str()), Some("program"));
        assert!(js.symbols.get("y").is_some());

        let broken = service.compile_request("javascript", Some("let y = (1 + ;")).unwrap();
        assert!(!broken.diagnostics.is_empty());
        assert_eq!(broken.diagnostics[0].line, 1);
    }
}
