//! Choice and continuation resolution.

use serde::{Deserialize, Serialize};
use tapestry_content::{Choice, Node};
use tapestry_core::flags::Flags;
use tapestry_core::predicate::matches;
use tapestry_core::presentation::ChoiceView;

/// Whether every linear node waits for an explicit continue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContinuationPolicy {
    /// Only nodes with `callForContinue` wait.
    #[default]
    PerNode,
    /// Every node with `autoNext` waits.
    Always,
}

/// A choice that passed its predicate, with its declaration position.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedChoice<'a> {
    /// Position within the node's declared choices.
    pub declared: usize,
    /// The choice itself.
    pub choice: &'a Choice,
}

/// Filters the choices of `node` by their predicates, preserving
/// declaration order.
///
/// The returned list is the canonical one: displayed indices and encoded
/// path indices both refer to positions in it.
#[must_use]
pub fn resolve_choices<'a>(node: &'a Node, flags: &Flags) -> Vec<ResolvedChoice<'a>> {
    node.choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| matches(choice.condition.as_ref(), flags))
        .map(|(declared, choice)| ResolvedChoice { declared, choice })
        .collect()
}

/// Builds the views handed to the stage for a resolved choice list.
#[must_use]
pub fn choice_views(choices: &[ResolvedChoice<'_>]) -> Vec<ChoiceView> {
    choices
        .iter()
        .enumerate()
        .map(|(index, resolved)| ChoiceView {
            index,
            text: resolved.choice.text.clone(),
            context: resolved.choice.context.clone(),
            narrative: resolved.choice.narrative,
        })
        .collect()
}

/// How a node hands over to the next one.
#[derive(Debug, Clone)]
pub enum Continuation<'a> {
    /// Wait for the player to pick one of these choices.
    Choices(Vec<ResolvedChoice<'a>>),
    /// Wait for an explicit continue, then move to `next`.
    AwaitContinue {
        /// Target node.
        next: &'a str,
    },
    /// Move to `next` on its own.
    AutoAdvance {
        /// Target node.
        next: &'a str,
    },
    /// Nothing follows.
    Terminal {
        /// `false` when the node never declared `end`.
        declared_end: bool,
    },
}

impl<'a> Continuation<'a> {
    /// Resolves the continuation of `node` in priority order: choices,
    /// awaited continue, auto-advance, terminal.
    #[must_use]
    pub fn resolve(node: &'a Node, flags: &Flags, policy: ContinuationPolicy) -> Self {
        let choices = resolve_choices(node, flags);
        if !choices.is_empty() {
            return Self::Choices(choices);
        }
        match node.auto_next() {
            Some(next) if node.call_for_continue || policy == ContinuationPolicy::Always => {
                Self::AwaitContinue { next }
            }
            Some(next) => Self::AutoAdvance { next },
            None => Self::Terminal {
                declared_end: node.end,
            },
        }
    }
}
