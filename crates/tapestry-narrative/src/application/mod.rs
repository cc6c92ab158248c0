//! Session context, effect dispatch, replay and playback.

pub mod effects;
pub mod playback;
pub mod playthrough;
mod render;
pub mod replay;
