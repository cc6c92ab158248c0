//! Resuming and snapshotting an orchestrator.

use tapestry_core::error::EngineError;
use tapestry_narrative::{Orchestrator, PlaybackOutcome, ReplayOutcome};
use tracing::{info, instrument};

use crate::domain::params::SessionParams;
use crate::domain::plan::{ResumePlan, ResumeTarget};

/// Result of resuming a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumed {
    /// The replay that preceded playback, if the plan had a path.
    pub replay: Option<ReplayOutcome>,
    /// Where playback came to rest.
    pub outcome: PlaybackOutcome,
}

/// Carries out `plan` on `orchestrator`.
///
/// A path is replayed silently and its final node is then presented
/// without adding to the history again. The orchestrator's playthrough must
/// have been created with `plan.premise`.
///
/// # Errors
///
/// Returns any error [`Orchestrator::play`] can return.
#[instrument(skip_all, fields(session = %orchestrator.playthrough().id()))]
pub async fn resume(orchestrator: &mut Orchestrator, plan: &ResumePlan) -> Result<Resumed, EngineError> {
    match &plan.target {
        ResumeTarget::Replay(path) => {
            let replay = orchestrator.replay(path);
            info!(
                node = %replay.final_node_id,
                consumed = replay.consumed,
                "resuming after replay"
            );
            let outcome = orchestrator.present(&replay.final_node_id, false).await?;
            Ok(Resumed {
                replay: Some(replay),
                outcome,
            })
        }
        ResumeTarget::StartAt(node) => {
            info!(%node, "resuming at node");
            let outcome = orchestrator.play(node).await?;
            Ok(Resumed { replay: None, outcome })
        }
    }
}

/// Captures the orchestrator's position as session parameters.
#[must_use]
pub fn snapshot(orchestrator: &Orchestrator) -> SessionParams {
    let playthrough = orchestrator.playthrough();
    SessionParams {
        node: Some(playthrough.current_node_id().to_owned()),
        path: playthrough.path().clone(),
        flags: playthrough.premise().clone(),
        version: playthrough.document().version().map(str::to_owned),
    }
}
