/// Language Domain Module
///
/// Defines the source languages the compile service accepts.

use std::path::Path;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    JavaScript,
}

impl Language {
    /// Parse language from string (CLI input or request field).
    pub fn from_str(s: &str) -> Option<Language> {
        match s.to_lowercase().as_str() {
            "c" => Some(Language::C),
            "javascript" | "js" => Some(Language::JavaScript),
            _ => None,
        }
    }

    /// Infer language from file extension.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_lowercase().as_str() {
            "c" | "h" => Some(Language::C),
            "js" | "mjs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    /// Infer language from a file path.
    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::JavaScript => "JavaScript",
        }
    }

    /// Lowercase identifier used on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::JavaScript => "javascript",
        }
    }

    /// File name the toolchain writes the submitted code to.
    pub fn source_file(&self) -> &'static str {
        match self {
            Language::C => "main.c",
            Language::JavaScript => "main.js",
        }
    }

    /// Default external tool that compiles or runs this language.
    pub fn toolchain_command(&self) -> &'static str {
        match self {
            Language::C => "gcc",
            Language::JavaScript => "node",
        }
    }

    /// Get installation instructions for the toolchain.
    pub fn install_instructions(&self) -> &'static str {
        match self {
            Language::C => "Install gcc: apt install build-essential (or xcode-select --install on macOS)",
            Language::JavaScript => "Install Node.js: https://nodejs.org/en/download",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::C
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
