// Diagnostics reported alongside the structural analysis.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One `{line, message}` pair. Line 0 means "not tied to a line".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// A diagnostic that is not tied to a source line.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

/// `file:line:column: severity: message`
static COMPILER_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^:\n]+:(?P<line>\d+):(?P<column>\d+):\s+(?P<severity>fatal error|error|warning):\s+(?P<message>.+?)\s*$")
        .expect("compiler message pattern")
});

/// Extract every structured compiler message from `stderr`, as
/// `{line, "<severity>: <message>"}`. Notes and context lines are skipped.
pub fn parse_compiler_messages(stderr: &str) -> Vec<Diagnostic> {
    COMPILER_MESSAGE
        .captures_iter(stderr)
        .filter_map(|caps| {
            let line = caps.name("line")?.as_str().parse().ok()?;
            let severity = caps.name("severity")?.as_str();
            let message = caps.name("message")?.as_str();
            Some(Diagnostic::new(line, format!("{}: {}", severity, message)))
        })
        .collect()
}

/// Translate the output of a failed toolchain step. Falls back to a
/// single line-0 entry carrying the raw text when nothing is structured.
pub fn translate_failure(stderr: &str) -> Vec<Diagnostic> {
    let parsed = parse_compiler_messages(stderr);
    if parsed.is_empty() {
        vec![Diagnostic::general(stderr.trim())]
    } else {
        parsed
    }
}
