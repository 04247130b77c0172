use thiserror::Error;

use crate::domain::language::Language;

/// Rejections that happen before any analysis runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("No code provided")]
    MissingCode,
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
    #[error("{0} is not enabled on this server")]
    UnsupportedLanguage(Language),
}
