//! Tapestry Narrative — traversal, replay and timed playback.
//!
//! The `domain` layer holds the pure rules: which text, choices and effects a
//! node resolves to under the current flags, how patches mutate flags, and
//! how a traversal path is encoded. The `application` layer drives those
//! rules against the presentation collaborators, either silently (replay) or
//! with cancellable timed reveals (playback).

pub mod application;
pub mod domain;

pub use application::effects::Effects;
pub use application::playback::{
    Orchestrator, PlaybackConfig, PlaybackControls, PlaybackOutcome, RenderToken, RenderTokens, SkipPolicy,
    SkipSignal,
};
pub use application::playthrough::{GameState, Playthrough};
pub use application::replay::{DEFAULT_STEP_LIMIT, Reconstruction, Reconstructor, ReplayOutcome, reconstruct};
pub use domain::continuation::{Continuation, ContinuationPolicy, ResolvedChoice, choice_views, resolve_choices};
pub use domain::defects::{PresentationDefect, ReplayDefect};
pub use domain::mutate::apply_patches;
pub use domain::path::{Path, PathToken};
pub use domain::resolve::{resolve_effects, resolve_predialogue, resolve_text};
