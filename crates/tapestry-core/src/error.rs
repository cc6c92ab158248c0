//! Engine error types.

use thiserror::Error;

/// Top-level engine error type.
///
/// Stale playback invocations are deliberately absent: superseding a
/// playback is the expected outcome of cancellation, not a failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A transition referenced a node that the document does not contain.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Input arrived while the current node was not waiting for any.
    #[error("no input is pending for node {0}")]
    NoPendingInput(String),

    /// A choice index outside the resolved choice list was selected.
    #[error("choice {index} is out of range: {available} choice(s) available")]
    ChoiceOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of resolved choices.
        available: usize,
    },

    /// The content document failed structural validation.
    #[error("invalid content document: {0}")]
    InvalidDocument(String),
}
