//! Deterministic reconstruction of a playthrough from its path.

use std::sync::Arc;

use tapestry_content::ContentDocument;
use tapestry_core::clock::SystemClock;
use tapestry_core::flags::Flags;
use tapestry_core::presentation::Headless;
use tracing::{info, instrument, warn};

use super::effects::Effects;
use super::playthrough::{GameState, Playthrough};
use super::render::prepare;
use crate::domain::continuation::{Continuation, ContinuationPolicy};
use crate::domain::defects::ReplayDefect;
use crate::domain::mutate::apply_patches;
use crate::domain::path::{Path, PathToken};

/// Number of nodes a replay may render before it gives up.
pub const DEFAULT_STEP_LIMIT: usize = 256;

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// The last node actually rendered.
    pub final_node_id: String,
    /// Number of path tokens that were accepted.
    pub consumed: usize,
    /// Why the replay stopped early, if it did.
    pub defect: Option<ReplayDefect>,
}

impl ReplayOutcome {
    /// Returns `true` if the path could not be fully honored.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.defect.is_some()
    }
}

/// Replays a path silently: no waits, no one-shot sounds, instant visuals.
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor {
    step_limit: usize,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

impl Reconstructor {
    /// Creates a reconstructor with the default step bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the step bound.
    #[must_use]
    pub fn with_step_limit(step_limit: usize) -> Self {
        Self { step_limit }
    }

    /// Resets `playthrough` and walks `path` from the start node.
    ///
    /// On return the playthrough sits on the last node rendered and its
    /// stored path holds only the accepted prefix of `path`.
    #[instrument(skip_all, fields(session = %playthrough.id(), path = %path))]
    pub fn run(&self, playthrough: &mut Playthrough, effects: &mut Effects, path: &Path) -> ReplayOutcome {
        playthrough.reset();
        let document = Arc::clone(playthrough.document());
        let tokens = path.tokens();

        let mut node_id = document.start.clone();
        let mut last_rendered = node_id.clone();
        let mut consumed = 0;
        let mut arrived_by = 0;
        let mut steps = 0;

        let defect = loop {
            if steps == self.step_limit {
                break Some(ReplayDefect::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }
            steps += 1;

            let Ok(prepared) = prepare(
                playthrough,
                effects,
                &document,
                &node_id,
                true,
                ContinuationPolicy::PerNode,
            ) else {
                consumed = arrived_by;
                break Some(ReplayDefect::MissingNode { node: node_id });
            };
            playthrough.record_node(&node_id, prepared.node.speaker(), &prepared.predialogue, &prepared.text);
            last_rendered.clone_from(&node_id);

            let next = match prepared.continuation {
                Continuation::Terminal { .. } => break None,
                Continuation::Choices(choices) => match tokens.get(consumed) {
                    None => break None,
                    Some(PathToken::Continue) => {
                        break Some(ReplayDefect::NotAChoice {
                            node: node_id,
                            position: consumed,
                        });
                    }
                    Some(PathToken::Choice(index)) => {
                        let Some(resolved) = choices.get(*index) else {
                            break Some(ReplayDefect::ChoiceOutOfRange {
                                node: node_id,
                                position: consumed,
                                index: *index,
                                available: choices.len(),
                            });
                        };
                        apply_patches(playthrough.flags_mut(), &resolved.choice.set);
                        resolved.choice.next.clone()
                    }
                },
                Continuation::AwaitContinue { next } | Continuation::AutoAdvance { next } => {
                    match tokens.get(consumed) {
                        None => break None,
                        Some(PathToken::Choice(_)) => {
                            break Some(ReplayDefect::ExpectedContinue {
                                node: node_id,
                                position: consumed,
                            });
                        }
                        Some(PathToken::Continue) => next.to_owned(),
                    }
                }
            };
            arrived_by = consumed;
            consumed += 1;
            node_id = next;
        };

        playthrough.set_current_node(&last_rendered);
        *playthrough.path_mut() = tokens[..consumed].iter().copied().collect();

        match &defect {
            Some(defect) => warn!(%defect, consumed, node = %last_rendered, "replay truncated"),
            None => info!(consumed, node = %last_rendered, "replay complete"),
        }

        ReplayOutcome {
            final_node_id: last_rendered,
            consumed,
            defect,
        }
    }
}

/// A finished headless replay.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// What the replay reports.
    pub outcome: ReplayOutcome,
    /// State after the replay.
    pub state: GameState,
    /// The accepted prefix of the input path.
    pub path: Path,
}

/// Replays `path` over `document` without any presentation collaborator.
///
/// The same document, premise and path always yield the same final node
/// and flags.
#[must_use]
pub fn reconstruct(document: Arc<ContentDocument>, premise: Flags, path: &Path) -> Reconstruction {
    let mut playthrough = Playthrough::new(document, premise, Arc::new(SystemClock), Box::new(Headless));
    let mut effects = Effects::new(Box::new(Headless));
    let outcome = Reconstructor::new().run(&mut playthrough, &mut effects, path);
    Reconstruction {
        outcome,
        state: playthrough.state().clone(),
        path: playthrough.path().clone(),
    }
}
