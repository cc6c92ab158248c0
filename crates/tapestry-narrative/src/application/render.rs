//! Node preparation shared by silent replay and animated playback.

use tapestry_content::{ContentDocument, Node, Timing};
use tapestry_core::error::EngineError;
use tracing::warn;

use super::effects::Effects;
use super::playthrough::Playthrough;
use crate::domain::continuation::{Continuation, ContinuationPolicy};
use crate::domain::mutate::apply_patches;
use crate::domain::resolve::{resolve_effects, resolve_predialogue, resolve_text};

/// A node with its content resolved and its flag patches applied.
pub(crate) struct Prepared<'a> {
    pub node: &'a Node,
    pub predialogue: Vec<String>,
    pub text: Vec<String>,
    pub continuation: Continuation<'a>,
}

/// Renders the non-visual part of a node.
///
/// Marks it current, applies `earlySet`, dispatches `nodeStart` effects,
/// resolves text and continuation, then applies `lateSet`. The continuation
/// is resolved before `lateSet`, so a late patch never changes the wiring
/// of the node that sets it. Portraits the node does not request again are
/// cleared unless `instant` is set.
pub(crate) fn prepare<'a>(
    playthrough: &mut Playthrough,
    effects: &mut Effects,
    document: &'a ContentDocument,
    node_id: &str,
    instant: bool,
    policy: ContinuationPolicy,
) -> Result<Prepared<'a>, EngineError> {
    let node = document
        .node(node_id)
        .ok_or_else(|| EngineError::NodeNotFound(node_id.to_owned()))?;
    playthrough.set_current_node(node_id);

    if !instant {
        effects.clear_stale_portraits(node, playthrough.flags());
    }
    apply_patches(playthrough.flags_mut(), &node.early_set);
    effects.apply(
        &document.assets,
        &resolve_effects(node, Timing::NodeStart, playthrough.flags()),
        instant,
    );

    let predialogue = resolve_predialogue(node, playthrough.flags());
    let text = resolve_text(node, playthrough.flags());
    let continuation = Continuation::resolve(node, playthrough.flags(), policy);
    if let Continuation::Terminal { declared_end: false } = continuation {
        warn!(node = node_id, "node has no way forward and is not marked as an end");
    }

    apply_patches(playthrough.flags_mut(), &node.late_set);

    Ok(Prepared {
        node,
        predialogue,
        text,
        continuation,
    })
}

/// Fires the effects of `node` scheduled at `timing`.
pub(crate) fn fire(playthrough: &Playthrough, effects: &mut Effects, document: &ContentDocument, node: &Node, timing: Timing) {
    let resolved = resolve_effects(node, timing, playthrough.flags());
    if !resolved.is_empty() {
        effects.apply(&document.assets, &resolved, false);
    }
}
