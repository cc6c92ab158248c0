//! Content loading errors.

use thiserror::Error;

use crate::validate::ValidationReport;

/// Errors raised while loading a content document.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The document file could not be read.
    #[error("failed to read content document: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON source is malformed or does not fit the document model.
    #[error("invalid JSON content document: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML source is malformed or does not fit the document model.
    #[error("invalid YAML content document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension does not name a supported format.
    #[error("unsupported content format: {0}")]
    UnsupportedFormat(String),

    /// The document parsed but failed structural validation.
    #[error("content document failed validation with {} error(s)", .0.errors.len())]
    Invalid(ValidationReport),
}
