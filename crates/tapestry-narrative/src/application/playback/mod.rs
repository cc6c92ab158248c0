//! Cancellable, timed playback of nodes.
//!
//! One [`Orchestrator`] owns the playthrough and its collaborators and is
//! driven from a single task. Other tasks reach it only through
//! [`PlaybackControls`], which can skip the running reveal or supersede the
//! whole invocation.

mod config;
mod orchestrator;
mod reveal;
mod skip;
mod token;

pub use config::PlaybackConfig;
pub use orchestrator::{Orchestrator, PlaybackControls, PlaybackOutcome};
pub use skip::{SkipPolicy, SkipSignal};
pub use token::{RenderToken, RenderTokens};
