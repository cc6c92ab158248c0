//! Deciding how to resume a session.

use tapestry_content::ContentDocument;
use tapestry_core::flags::Flags;
use tapestry_narrative::Path;
use tracing::warn;

use super::params::SessionParams;

/// Where a resumed session picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeTarget {
    /// Replay these decisions from the start node.
    Replay(Path),
    /// Play this node directly.
    StartAt(String),
}

/// How to resume a session from its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePlan {
    /// Flags the playthrough starts from.
    pub premise: Flags,
    /// Where to pick up.
    pub target: ResumeTarget,
    /// `true` when the parameters name a content version other than the
    /// document's. The plan is still followed; progress may not line up.
    pub version_mismatch: bool,
}

impl ResumePlan {
    /// Builds a plan: a non-empty path is replayed; otherwise an existing
    /// `node` is played directly; otherwise the start node is played.
    #[must_use]
    pub fn from_params(document: &ContentDocument, params: &SessionParams) -> Self {
        let version_mismatch = params
            .version
            .as_deref()
            .is_some_and(|version| Some(version) != document.version());
        if version_mismatch {
            warn!(
                link_version = params.version.as_deref().unwrap_or_default(),
                document_version = document.version().unwrap_or("unversioned"),
                "session was saved against a different content version"
            );
        }

        let target = if !params.path.is_empty() {
            ResumeTarget::Replay(params.path.clone())
        } else {
            match params.node.as_deref() {
                Some(node) if document.node(node).is_some() => ResumeTarget::StartAt(node.to_owned()),
                Some(node) => {
                    warn!(node, "requested node does not exist, starting over");
                    ResumeTarget::StartAt(document.start.clone())
                }
                None => ResumeTarget::StartAt(document.start.clone()),
            }
        };

        Self {
            premise: params.flags.clone(),
            target,
            version_mismatch,
        }
    }
}
