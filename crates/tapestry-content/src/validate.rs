//! Structural validator.
//!
//! Run once before a session starts. Any error-severity defect blocks play;
//! warnings are logged and play proceeds in a degraded mode.

use std::collections::BTreeSet;

use tapestry_core::predicate::Predicate;
use thiserror::Error;

use crate::document::{AssetKind, ContentDocument, Node, NodeKind, PatchEntry};

/// Severity of a content defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the session.
    Error,
    /// Advisory only.
    Warning,
}

/// Which patch list of a node a defect refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchList {
    /// `earlySet`
    Early,
    /// `lateSet`
    Late,
}

impl std::fmt::Display for PatchList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Early => "earlySet",
            Self::Late => "lateSet",
        })
    }
}

/// A structural problem in a content document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentDefect {
    /// The document has no nodes at all.
    #[error("[global] document has no nodes")]
    NoNodes,

    /// `start` does not name an existing node.
    #[error("[global] start references missing node \"{0}\"")]
    MissingStart(String),

    /// A node with no choices, no `autoNext` and no `end`.
    #[error("[nodeId={0}] node is a dead-end (no choices, no autoNext, not end=true)")]
    DeadEnd(String),

    /// `callForContinue` without a continuation target.
    #[error("[nodeId={0}] callForContinue is true but node has no autoNext")]
    ContinueWithoutAutoNext(String),

    /// `autoNext` pointing back at its own node.
    #[error("[nodeId={0}] autoNext references itself (self-loop)")]
    AutoNextSelfLoop(String),

    /// `autoNext` pointing at a node that does not exist.
    #[error("[nodeId={node}] autoNext references missing node \"{target}\"")]
    AutoNextMissing {
        /// Offending node.
        node: String,
        /// Missing target id.
        target: String,
    },

    /// A choice without a `next` target.
    #[error("[nodeId={node}] choice[{index}] missing 'next' property")]
    ChoiceMissingNext {
        /// Offending node.
        node: String,
        /// Choice position in declaration order.
        index: usize,
    },

    /// A choice pointing back at its own node.
    #[error("[nodeId={node}] choice[{index}] next references itself (self-loop)")]
    ChoiceSelfLoop {
        /// Offending node.
        node: String,
        /// Choice position in declaration order.
        index: usize,
    },

    /// A choice pointing at a node that does not exist.
    #[error("[nodeId={node}] choice[{index}] next references missing node \"{target}\"")]
    ChoiceTargetMissing {
        /// Offending node.
        node: String,
        /// Choice position in declaration order.
        index: usize,
        /// Missing target id.
        target: String,
    },

    /// A choice with empty display text.
    #[error("[nodeId={node}] choice[{index}] missing or invalid text")]
    ChoiceMissingText {
        /// Offending node.
        node: String,
        /// Choice position in declaration order.
        index: usize,
    },

    /// A text variant with neither `if` nor `else`.
    #[error("[nodeId={node}] textVariants[{index}] missing required \"if\" condition (or else=true)")]
    VariantMissingCondition {
        /// Offending node.
        node: String,
        /// Variant position.
        index: usize,
    },

    /// A text variant without text.
    #[error("[nodeId={node}] textVariants[{index}] missing 'text' property")]
    VariantMissingText {
        /// Offending node.
        node: String,
        /// Variant position.
        index: usize,
    },

    /// A conditional patch entry without its `set` body.
    #[error("[nodeId={node}] {list}[{index}] conditional entry missing 'set' object")]
    PatchMissingBody {
        /// Offending node.
        node: String,
        /// Patch list containing the entry.
        list: PatchList,
        /// Entry position.
        index: usize,
    },

    /// A dialogue node without a speaker.
    #[error("[nodeId={0}] dialogue node has no speaker")]
    DialogueWithoutSpeaker(String),

    /// An effect key absent from its asset table.
    #[error("[nodeId={node}] effect[{index}] {kind} \"{key}\" missing in assets.{kind}")]
    MissingAsset {
        /// Offending node.
        node: String,
        /// Effect position.
        index: usize,
        /// Asset table consulted.
        kind: AssetKind,
        /// Missing key.
        key: String,
    },

    /// A predicate referencing a flag that no patch in the document sets.
    #[error("[nodeId={node}] {site} if references unknown flag \"{flag}\"")]
    UnknownFlag {
        /// Offending node.
        node: String,
        /// Where the predicate lives, e.g. `choice[2]`.
        site: String,
        /// Unknown flag name.
        flag: String,
    },
}

impl ContentDefect {
    /// Severity of this defect.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::AutoNextMissing { .. }
            | Self::ChoiceTargetMissing { .. }
            | Self::ChoiceMissingText { .. }
            | Self::DialogueWithoutSpeaker(_)
            | Self::MissingAsset { .. }
            | Self::UnknownFlag { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Outcome of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Defects that block the session.
    pub errors: Vec<ContentDefect>,
    /// Advisory defects.
    pub warnings: Vec<ContentDefect>,
}

impl ValidationReport {
    /// Returns `true` when no error-severity defect was found.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, one per defect.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Warning messages, one per defect.
    #[must_use]
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, defect: ContentDefect) {
        match defect.severity() {
            Severity::Error => self.errors.push(defect),
            Severity::Warning => self.warnings.push(defect),
        }
    }
}

/// Validates the structure of `document`.
#[must_use]
pub fn validate(document: &ContentDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    if document.nodes.is_empty() {
        report.push(ContentDefect::NoNodes);
    } else if document.node(&document.start).is_none() {
        report.push(ContentDefect::MissingStart(document.start.clone()));
    }

    let known_flags = collect_written_flags(document);
    for (id, node) in &document.nodes {
        validate_transitions(document, id, node, &mut report);
        validate_text(id, node, &mut report);
        validate_patches(id, node, &mut report);
        validate_assets(document, id, node, &mut report);
        validate_flag_references(id, node, &known_flags, &mut report);
    }

    report
}

fn collect_written_flags(document: &ContentDocument) -> BTreeSet<&str> {
    let mut keys = BTreeSet::new();
    for node in document.nodes.values() {
        let entries = node
            .early_set
            .iter()
            .chain(&node.late_set)
            .chain(node.choices.iter().flat_map(|choice| &choice.set));
        for entry in entries {
            keys.extend(entry.written_keys());
        }
    }
    keys
}

fn validate_transitions(
    document: &ContentDocument,
    id: &str,
    node: &Node,
    report: &mut ValidationReport,
) {
    let auto_next = node.auto_next();

    if node.choices.is_empty() && auto_next.is_none() && !node.end {
        report.push(ContentDefect::DeadEnd(id.to_owned()));
    }

    if node.call_for_continue && auto_next.is_none() {
        report.push(ContentDefect::ContinueWithoutAutoNext(id.to_owned()));
    }

    if let Some(target) = auto_next {
        if target == id {
            report.push(ContentDefect::AutoNextSelfLoop(id.to_owned()));
        } else if document.node(target).is_none() {
            report.push(ContentDefect::AutoNextMissing {
                node: id.to_owned(),
                target: target.to_owned(),
            });
        }
    }

    for (index, choice) in node.choices.iter().enumerate() {
        if choice.text.trim().is_empty() {
            report.push(ContentDefect::ChoiceMissingText {
                node: id.to_owned(),
                index,
            });
        }
        if choice.next.is_empty() {
            report.push(ContentDefect::ChoiceMissingNext {
                node: id.to_owned(),
                index,
            });
        } else if choice.next == id {
            report.push(ContentDefect::ChoiceSelfLoop {
                node: id.to_owned(),
                index,
            });
        } else if document.node(&choice.next).is_none() {
            report.push(ContentDefect::ChoiceTargetMissing {
                node: id.to_owned(),
                index,
                target: choice.next.clone(),
            });
        }
    }
}

fn validate_text(id: &str, node: &Node, report: &mut ValidationReport) {
    if matches!(&node.kind, NodeKind::Dialogue { speaker } if speaker.is_empty()) {
        report.push(ContentDefect::DialogueWithoutSpeaker(id.to_owned()));
    }

    for (index, variant) in node.text_variants.iter().enumerate() {
        if variant.text.is_empty() {
            report.push(ContentDefect::VariantMissingText {
                node: id.to_owned(),
                index,
            });
        }
        if variant.condition.is_none() && !variant.fallback {
            report.push(ContentDefect::VariantMissingCondition {
                node: id.to_owned(),
                index,
            });
        }
    }
}

fn validate_patches(id: &str, node: &Node, report: &mut ValidationReport) {
    for (list, entries) in [(PatchList::Early, &node.early_set), (PatchList::Late, &node.late_set)] {
        for (index, entry) in entries.iter().enumerate() {
            if matches!(entry, PatchEntry::Conditional { set: None, .. }) {
                report.push(ContentDefect::PatchMissingBody {
                    node: id.to_owned(),
                    list,
                    index,
                });
            }
        }
    }
}

fn validate_assets(document: &ContentDocument, id: &str, node: &Node, report: &mut ValidationReport) {
    for (index, effect) in node.effects.iter().enumerate() {
        let keys = [
            (AssetKind::Background, effect.background.as_deref()),
            (AssetKind::Soundtrack, effect.soundtrack.as_deref()),
            (AssetKind::Portrait, effect.portrait_left.as_deref()),
            (AssetKind::Portrait, effect.portrait_right.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, key)| key.map(|key| (kind, key)))
        .chain(
            effect
                .sound_effect
                .iter()
                .map(|sfx| (AssetKind::SoundEffect, sfx.key.as_str())),
        );

        for (kind, key) in keys {
            if document.assets.lookup(kind, key).is_none() {
                report.push(ContentDefect::MissingAsset {
                    node: id.to_owned(),
                    index,
                    kind,
                    key: key.to_owned(),
                });
            }
        }
    }
}

fn validate_flag_references(
    id: &str,
    node: &Node,
    known: &BTreeSet<&str>,
    report: &mut ValidationReport,
) {
    let mut sites: Vec<(String, &Predicate)> = Vec::new();
    for (index, choice) in node.choices.iter().enumerate() {
        if let Some(condition) = &choice.condition {
            sites.push((format!("choice[{index}]"), condition));
        }
    }
    for (index, effect) in node.effects.iter().enumerate() {
        if let Some(condition) = &effect.condition {
            sites.push((format!("effect[{index}]"), condition));
        }
    }
    for (index, variant) in node.text_variants.iter().enumerate() {
        if let Some(condition) = &variant.condition {
            sites.push((format!("textVariants[{index}]"), condition));
        }
    }
    if let Some(condition) = node.predialogue.as_ref().and_then(|p| p.condition.as_ref()) {
        sites.push(("predialogue".to_owned(), condition));
    }
    for (list, entries) in [(PatchList::Early, &node.early_set), (PatchList::Late, &node.late_set)] {
        for (index, entry) in entries.iter().enumerate() {
            if let PatchEntry::Conditional { condition, .. } = entry {
                sites.push((format!("{list}[{index}]"), condition));
            }
        }
    }

    for (site, predicate) in sites {
        for flag in predicate.keys().filter(|flag| !known.contains(flag)) {
            report.push(ContentDefect::UnknownFlag {
                node: id.to_owned(),
                site: site.clone(),
                flag: flag.to_owned(),
            });
        }
    }
}
