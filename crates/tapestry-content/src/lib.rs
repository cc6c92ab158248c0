//! Tapestry — Content document model.
//!
//! Responsible for the immutable narrative document: its typed model,
//! loading from JSON or YAML, fingerprinting, and the structural validator
//! that gates every session before play begins.

pub mod document;
pub mod error;
pub mod loader;
pub mod validate;

pub use document::{
    AssetKind, Assets, Choice, ContentDocument, Effect, Meta, Node, NodeKind, PatchEntry,
    Predialogue, SoundEffect, TextVariant, Timing,
};
pub use error::ContentError;
pub use loader::{
    DocumentFormat, LoadedDocument, fingerprint, load_document, load_source, parse_document,
};
pub use validate::{ContentDefect, PatchList, Severity, ValidationReport, validate};
