//! Render tokens: invocation identity for cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tapestry_core::cancel::Cancellation;

/// Issues monotonically increasing render tokens. Issuing a token
/// invalidates every token issued before it.
#[derive(Debug, Default)]
pub struct RenderTokens {
    current: AtomicU64,
}

impl RenderTokens {
    /// Creates a source with no token issued yet.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Issues a fresh token, superseding the previous one.
    #[must_use]
    pub fn issue(self: &Arc<Self>) -> RenderToken {
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        RenderToken {
            id,
            source: Arc::clone(self),
        }
    }

    /// Id of the most recently issued token.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Invalidates the current token without issuing a usable one.
    pub fn supersede(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

/// Identity of one playback invocation.
#[derive(Debug, Clone)]
pub struct RenderToken {
    id: u64,
    source: Arc<RenderTokens>,
}

impl RenderToken {
    /// Numeric id, unique per source.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Cancellation for RenderToken {
    fn is_cancelled(&self) -> bool {
        self.source.current() != self.id
    }
}
