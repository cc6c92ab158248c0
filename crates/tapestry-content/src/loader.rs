//! Loading content documents from disk.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::document::ContentDocument;
use crate::error::ContentError;
use crate::validate::{ValidationReport, validate};

/// Serialization format of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON source.
    Json,
    /// YAML source.
    Yaml,
}

impl DocumentFormat {
    /// Infers the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnsupportedFormat` for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ContentError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// A parsed, validated document together with its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// The parsed document.
    pub document: ContentDocument,
    /// SHA-256 of the source text, hex encoded.
    pub fingerprint: String,
    /// Validation findings. Contains warnings only; errors fail the load.
    pub report: ValidationReport,
}

/// Parses a document without validating it.
///
/// # Errors
///
/// Returns `ContentError::Json` or `ContentError::Yaml` when the source does
/// not fit the document model.
pub fn parse_document(source: &str, format: DocumentFormat) -> Result<ContentDocument, ContentError> {
    let document = match format {
        DocumentFormat::Json => serde_json::from_str(source)?,
        DocumentFormat::Yaml => serde_yaml::from_str(source)?,
    };
    Ok(document)
}

/// Hex-encoded SHA-256 of a document source.
#[must_use]
pub fn fingerprint(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Parses and validates a document source.
///
/// Warnings are logged and kept in the returned report.
///
/// # Errors
///
/// Returns a parse error, or `ContentError::Invalid` when validation finds
/// any error-severity defect.
pub fn load_source(source: &str, format: DocumentFormat) -> Result<LoadedDocument, ContentError> {
    let document = parse_document(source, format)?;
    let report = validate(&document);

    for warning in &report.warnings {
        warn!(defect = %warning, "content warning");
    }
    if !report.is_playable() {
        for error in &report.errors {
            tracing::error!(defect = %error, "content error");
        }
        return Err(ContentError::Invalid(report));
    }

    Ok(LoadedDocument {
        document,
        fingerprint: fingerprint(source),
        report,
    })
}

/// Reads, parses and validates the document at `path`.
///
/// # Errors
///
/// Returns `ContentError::Io` if the file cannot be read, plus every error
/// [`load_source`] can return.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_document(path: &Path) -> Result<LoadedDocument, ContentError> {
    let format = DocumentFormat::from_path(path)?;
    let source = std::fs::read_to_string(path)?;
    let loaded = load_source(&source, format)?;

    info!(
        title = %loaded.document.meta.title,
        version = loaded.document.version().unwrap_or("unversioned"),
        nodes = loaded.document.nodes.len(),
        fingerprint = %loaded.fingerprint,
        "content document loaded"
    );

    Ok(loaded)
}
