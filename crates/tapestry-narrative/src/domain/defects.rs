//! Recoverable defects surfaced during replay and presentation.
//!
//! Neither kind aborts a session: a replay defect truncates the path, a
//! presentation defect skips one visual or audio change.

use tapestry_content::AssetKind;
use thiserror::Error;

/// Why a replay stopped before consuming its whole path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayDefect {
    /// The traversal reached a node id the document does not contain.
    #[error("replay reached missing node {node}")]
    MissingNode {
        /// The missing node id.
        node: String,
    },

    /// A continuation token was found where a choice index was required.
    #[error("token {position} is not a choice index at node {node}")]
    NotAChoice {
        /// Node awaiting a choice.
        node: String,
        /// Zero-based position of the offending token.
        position: usize,
    },

    /// A choice index outside the resolved choice list.
    #[error("token {position} selects choice {index} at node {node}, but only {available} resolved")]
    ChoiceOutOfRange {
        /// Node awaiting a choice.
        node: String,
        /// Zero-based position of the offending token.
        position: usize,
        /// Requested index.
        index: usize,
        /// Number of resolved choices.
        available: usize,
    },

    /// A choice index was found where a continuation was required.
    #[error("token {position} should continue past node {node}")]
    ExpectedContinue {
        /// Node awaiting continuation.
        node: String,
        /// Zero-based position of the offending token.
        position: usize,
    },

    /// The traversal did not settle within the step bound.
    #[error("replay exceeded {limit} steps")]
    StepLimitExceeded {
        /// The bound that was hit.
        limit: usize,
    },
}

/// A presentation change that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentationDefect {
    /// An effect referenced a key missing from its asset table.
    #[error("asset {key} is missing from {kind}")]
    MissingAsset {
        /// The table that was consulted.
        kind: AssetKind,
        /// The missing key.
        key: String,
    },
}
