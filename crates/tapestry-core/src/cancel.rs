//! Cooperative cancellation.
//!
//! Playback checks for cancellation only at phase boundaries. Any scheduler
//! can plug in its own notion of "this invocation is stale" by implementing
//! [`Cancellation`].

/// A cancellation handle consulted at phase boundaries.
pub trait Cancellation: Send + Sync {
    /// Returns `true` once the owning invocation has been superseded.
    fn is_cancelled(&self) -> bool;
}

/// A handle that is never cancelled. Used for silent rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}
