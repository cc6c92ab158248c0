//! Content resolution: which text, predialogue and effects a node shows
//! under the current flags.

use tapestry_content::{Effect, Node, Timing};
use tapestry_core::flags::Flags;
use tapestry_core::predicate::matches;

/// Resolves the body text of `node`.
///
/// Variants with an `if` predicate are scanned first, in order, and the
/// first match wins. Failing that, the first `else` variant is used, and
/// failing that, the node's base text.
#[must_use]
pub fn resolve_text(node: &Node, flags: &Flags) -> Vec<String> {
    let conditional = node.text_variants.iter().find(|variant| {
        variant
            .condition
            .as_ref()
            .is_some_and(|condition| condition.matches(flags))
    });
    let fallback = || node.text_variants.iter().find(|variant| variant.fallback);

    conditional
        .or_else(fallback)
        .map_or_else(|| node.text.clone(), |variant| variant.text.clone())
}

/// Resolves the predialogue lines of `node`; empty when it has none or its
/// predicate does not match.
#[must_use]
pub fn resolve_predialogue(node: &Node, flags: &Flags) -> Vec<String> {
    node.predialogue
        .as_ref()
        .filter(|predialogue| matches(predialogue.condition.as_ref(), flags))
        .map(|predialogue| predialogue.text.clone())
        .unwrap_or_default()
}

/// Selects the effects of `node` that fire at `timing`, in declaration
/// order. Untagged effects fire at [`Timing::NodeStart`].
#[must_use]
pub fn resolve_effects<'a>(node: &'a Node, timing: Timing, flags: &Flags) -> Vec<&'a Effect> {
    node.effects
        .iter()
        .filter(|effect| effect.timing() == timing && matches(effect.condition.as_ref(), flags))
        .collect()
}
