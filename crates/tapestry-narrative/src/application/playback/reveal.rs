//! Staggered reveal of staged elements.

use std::time::Duration;

use tapestry_core::cancel::Cancellation;
use tapestry_core::presentation::{Region, Stage};
use tokio::time::sleep;
use tracing::debug;

use super::skip::SkipSignal;
use super::token::RenderToken;

/// How a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Reveal {
    Completed,
    Superseded,
}

/// Timing of one staggered reveal.
#[derive(Debug, Clone, Copy)]
pub(super) struct Stagger {
    pub delay: Duration,
    pub fade: Duration,
}

/// Fades in `count` elements of `region` one after another, `delay` apart,
/// then waits one `fade` for the last one to settle.
///
/// A skip armed for `token` shows every remaining element at once; the
/// closing `fade` wait still happens. A per-reveal skip left over from
/// before the reveal started is discarded.
pub(super) async fn staggered(
    stage: &mut dyn Stage,
    region: Region,
    count: usize,
    timing: Stagger,
    token: &RenderToken,
    skip: &SkipSignal,
) -> Reveal {
    skip.discard_unused();
    let mut index = 0;
    while index < count {
        if token.is_cancelled() {
            return Reveal::Superseded;
        }
        if skip.consume(token) {
            debug!(?region, from = index, "reveal skipped");
            for rest in index..count {
                stage.reveal_element(region, rest, Duration::ZERO);
            }
            break;
        }
        stage.reveal_element(region, index, timing.fade);
        index += 1;
        tokio::select! {
            () = sleep(timing.delay) => {}
            () = skip.armed(token) => {}
        }
    }
    if token.is_cancelled() {
        return Reveal::Superseded;
    }
    // A skip that landed during the last delay belongs to this reveal.
    skip.consume(token);
    sleep(timing.fade).await;
    Reveal::Completed
}
