// Application layer: request validation and result assembly.

use std::collections::HashMap;

use log::{debug, info};

use crate::domain::language::Language;
use crate::domain::result::AnalysisResult;
use crate::ports::{SourceAnalyzer, Toolchain};

pub mod error;

pub use error::RequestError;

/// Runs both analysis passes over one source text, then the toolchain.
pub struct AnalyzeUsecase<'a> {
    pub analyzer: &'a dyn SourceAnalyzer,
    pub toolchain: Option<&'a dyn Toolchain>,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn run(&self, source: &str) -> AnalysisResult {
        // The passes share nothing, so they run side by side.
        let ((tree, symbols), syntax_errors) = rayon::join(
            || {
                rayon::join(
                    || self.analyzer.build_tree(source),
                    || self.analyzer.build_symbol_table(source),
                )
            },
            || self.analyzer.syntax_errors(source),
        );

        let mut result = AnalysisResult {
            tree,
            symbols,
            ..Default::default()
        };

        if !syntax_errors.is_empty() {
            debug!("[compile] {} syntax errors, not executing", syntax_errors.len());
            result.diagnostics = syntax_errors;
            return result;
        }

        if let Some(toolchain) = self.toolchain {
            let report = toolchain.execute(source);
            result.diagnostics = report.diagnostics;
            result.execution_output = report.output;
        }
        result
    }
}

/// One language's analyzer and, when execution is enabled, its toolchain.
pub struct LanguagePipeline {
    pub analyzer: Box<dyn SourceAnalyzer>,
    pub toolchain: Option<Box<dyn Toolchain>>,
}

/// Dispatches compile requests to the registered language pipelines.
#[derive(Default)]
pub struct CompileService {
    pipelines: HashMap<Language, LanguagePipeline>,
}

impl CompileService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(mut self, pipeline: LanguagePipeline) -> Self {
        self.pipelines.insert(pipeline.analyzer.language(), pipeline);
        self
    }

    pub fn supports(&self, language: Language) -> bool {
        self.pipelines.contains_key(&language)
    }

    /// Validate a request whose language is still a raw string.
    pub fn compile_request(&self, language: &str, code: Option<&str>) -> Result<AnalysisResult, RequestError> {
        let language = Language::from_str(language)
            .ok_or_else(|| RequestError::UnknownLanguage(language.to_string()))?;
        self.compile(language, code)
    }

    /// Empty or whitespace-only code is rejected before any analyzer runs.
    pub fn compile(&self, language: Language, code: Option<&str>) -> Result<AnalysisResult, RequestError> {
        let code = code
            .filter(|code| !code.trim().is_empty())
            .ok_or(RequestError::MissingCode)?;
        let pipeline = self
            .pipelines
            .get(&language)
            .ok_or(RequestError::UnsupportedLanguage(language))?;

        info!("[compile] {} request, {} bytes", language, code.len());
        let usecase = AnalyzeUsecase {
            analyzer: pipeline.analyzer.as_ref(),
            toolchain: pipeline.toolchain.as_deref(),
        };
        let result = usecase.run(code);
        debug!(
            "[compile] {} symbols, {} diagnostics",
            result.symbols.len(),
            result.diagnostics.len()
        );
        Ok(result)
    }
}
