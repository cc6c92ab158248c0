//! Skip requests for the running reveal.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use super::token::RenderToken;

/// How long an armed skip lasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipPolicy {
    /// A skip completes the reveal that is running and is then used up. A
    /// skip that arrives between reveals (during a pause or a closing fade)
    /// is dropped when the next reveal starts.
    #[default]
    PerReveal,
    /// A skip completes every remaining reveal of the node.
    Sticky,
}

/// A skip request bound to one render token.
///
/// Token id `0` is never issued and marks the signal as unarmed.
#[derive(Debug)]
pub struct SkipSignal {
    armed: AtomicU64,
    policy: SkipPolicy,
    notify: Notify,
}

impl SkipSignal {
    /// Creates an unarmed signal.
    #[must_use]
    pub fn new(policy: SkipPolicy) -> Self {
        Self {
            armed: AtomicU64::new(0),
            policy,
            notify: Notify::new(),
        }
    }

    /// Arms a skip for the invocation holding token `token_id` and wakes
    /// any reveal waiting on it.
    pub fn arm(&self, token_id: u64) {
        self.armed.store(token_id, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Disarms the signal.
    pub fn clear(&self) {
        self.armed.store(0, Ordering::Release);
    }

    /// Drops a skip no reveal has taken. Sticky skips are kept.
    pub fn discard_unused(&self) {
        if self.policy == SkipPolicy::PerReveal {
            self.clear();
        }
    }

    /// Returns `true` if a skip is armed for `token`.
    #[must_use]
    pub fn is_armed(&self, token: &RenderToken) -> bool {
        self.armed.load(Ordering::Acquire) == token.id()
    }

    /// Takes the skip armed for `token`, if any. Under
    /// [`SkipPolicy::Sticky`] the skip stays armed.
    pub fn consume(&self, token: &RenderToken) -> bool {
        match self.policy {
            SkipPolicy::Sticky => self.is_armed(token),
            SkipPolicy::PerReveal => self
                .armed
                .compare_exchange(token.id(), 0, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }

    /// Completes once a skip is armed for `token`.
    pub async fn armed(&self, token: &RenderToken) {
        loop {
            let notified = self.notify.notified();
            if self.is_armed(token) {
                return;
            }
            notified.await;
        }
    }
}
