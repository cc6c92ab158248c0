//! Typed model of a content document.
//!
//! Field names follow the on-disk JSON format (`camelCase`, `if`/`else`,
//! `type` discriminator). Several fields accept either a single value or a
//! list; they are normalized to lists on load.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tapestry_core::flags::Flags;
use tapestry_core::predicate::Predicate;
use tapestry_core::presentation::LineStyle;

/// The full narrative document. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentDocument {
    /// Title and content version.
    pub meta: Meta,
    /// Asset tables consulted by the presentation surface.
    #[serde(default)]
    pub assets: Assets,
    /// Id of the first node.
    pub start: String,
    /// Every node, keyed by id.
    pub nodes: BTreeMap<String, Node>,
}

impl ContentDocument {
    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Content version the document declares, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.meta.version.as_deref()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Content version used to detect stale resume links.
    #[serde(default)]
    pub version: Option<String>,
}

/// Asset tables: logical key to opaque resource reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    /// Background images.
    #[serde(default)]
    pub backgrounds: BTreeMap<String, String>,
    /// Looping background tracks.
    #[serde(default)]
    pub soundtracks: BTreeMap<String, String>,
    /// One-shot sound effects.
    #[serde(default)]
    pub sound_effects: BTreeMap<String, String>,
    /// Character portraits.
    #[serde(default)]
    pub portraits: BTreeMap<String, String>,
}

impl Assets {
    /// Resolves `key` in the table for `kind`.
    #[must_use]
    pub fn lookup(&self, kind: AssetKind, key: &str) -> Option<&str> {
        let table = match kind {
            AssetKind::Background => &self.backgrounds,
            AssetKind::Soundtrack => &self.soundtracks,
            AssetKind::SoundEffect => &self.sound_effects,
            AssetKind::Portrait => &self.portraits,
        };
        table.get(key).map(String::as_str)
    }
}

/// The asset table an effect key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// `assets.backgrounds`
    Background,
    /// `assets.soundtracks`
    Soundtrack,
    /// `assets.soundEffects`
    SoundEffect,
    /// `assets.portraits`
    Portrait,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Background => "backgrounds",
            Self::Soundtrack => "soundtracks",
            Self::SoundEffect => "soundEffects",
            Self::Portrait => "portraits",
        })
    }
}

/// Node variant. Shared fields live on [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    /// Narrator voice.
    Narration,
    /// A character speaking.
    Dialogue {
        /// Speaker identifier.
        #[serde(default)]
        speaker: String,
    },
    /// Meta or debug message.
    System,
}

/// One unit of narrative content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Variant and variant-specific fields.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Optional title for tooling.
    #[serde(default)]
    pub title: Option<String>,
    /// Scene grouping, informational only.
    #[serde(default)]
    pub scene: Option<String>,
    /// Static body text.
    #[serde(default, deserialize_with = "one_or_many")]
    pub text: Vec<String>,
    /// Conditional body text, scanned in order.
    #[serde(default)]
    pub text_variants: Vec<TextVariant>,
    /// Secondary text block shown before the speaker.
    #[serde(default)]
    pub predialogue: Option<Predialogue>,
    /// Branching choices, in declaration order.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Linear continuation target.
    #[serde(default)]
    pub auto_next: Option<String>,
    /// Presentation effects.
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Flag patches applied before the node is presented.
    #[serde(default)]
    pub early_set: Vec<PatchEntry>,
    /// Flag patches applied once continuation wiring is known.
    #[serde(default)]
    pub late_set: Vec<PatchEntry>,
    /// Wait for an explicit continue instead of auto-advancing.
    #[serde(default)]
    pub call_for_continue: bool,
    /// Marks the end of the experience.
    #[serde(default)]
    pub end: bool,
}

impl Node {
    /// Speaker of a dialogue node with a non-empty speaker.
    #[must_use]
    pub fn speaker(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Dialogue { speaker } if !speaker.is_empty() => Some(speaker),
            _ => None,
        }
    }

    /// How body lines of this node should be styled.
    #[must_use]
    pub fn line_style(&self) -> LineStyle {
        match self.kind {
            NodeKind::Narration => LineStyle::Narration,
            NodeKind::Dialogue { .. } => LineStyle::Dialogue,
            NodeKind::System => LineStyle::System,
        }
    }

    /// Non-empty `autoNext` target.
    #[must_use]
    pub fn auto_next(&self) -> Option<&str> {
        self.auto_next.as_deref().filter(|id| !id.is_empty())
    }
}

/// Conditional body text.
///
/// `if` variants are scanned first; an `else` variant is only a fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct TextVariant {
    /// Predicate selecting this variant.
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,
    /// Marks the fallback variant.
    #[serde(rename = "else", default)]
    pub fallback: bool,
    /// Text lines.
    #[serde(default, deserialize_with = "one_or_many")]
    pub text: Vec<String>,
}

/// Secondary text block with its own visibility condition.
#[derive(Debug, Clone, Deserialize)]
pub struct Predialogue {
    /// Text lines.
    #[serde(default, deserialize_with = "one_or_many")]
    pub text: Vec<String>,
    /// Visibility predicate.
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,
}

/// A player choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Display text.
    #[serde(default)]
    pub text: String,
    /// Bracketed context label shown before the text.
    #[serde(default)]
    pub context: Option<String>,
    /// Narrative-styled choice (presentation only).
    #[serde(default)]
    pub narrative: bool,
    /// Target node id.
    #[serde(default)]
    pub next: String,
    /// Visibility predicate.
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,
    /// Flag patches applied when the choice is taken.
    #[serde(default, deserialize_with = "one_or_many")]
    pub set: Vec<PatchEntry>,
}

/// When an effect fires during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Timing {
    /// While preparing the node. Untagged effects use this timing.
    NodeStart,
    /// Before the predialogue reveal.
    PredialogueStart,
    /// After the predialogue reveal.
    PredialogueEnd,
    /// Before the body text reveal.
    TextStart,
    /// After the body text reveal.
    TextEnd,
    /// Before the choices reveal.
    ChoicesStart,
    /// When the continue control appears.
    CallForContinue,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NodeStart => "nodeStart",
            Self::PredialogueStart => "predialogueStart",
            Self::PredialogueEnd => "predialogueEnd",
            Self::TextStart => "textStart",
            Self::TextEnd => "textEnd",
            Self::ChoicesStart => "choicesStart",
            Self::CallForContinue => "callForContinue",
        })
    }
}

/// A one-shot sound effect reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SoundEffectRepr")]
pub struct SoundEffect {
    /// Key into `assets.soundEffects`.
    pub key: String,
    /// Playback volume; defaults to full volume.
    pub volume: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SoundEffectRepr {
    Key(String),
    Spec { src: String, volume: Option<f64> },
}

impl From<SoundEffectRepr> for SoundEffect {
    fn from(repr: SoundEffectRepr) -> Self {
        match repr {
            SoundEffectRepr::Key(key) => Self { key, volume: None },
            SoundEffectRepr::Spec { src, volume } => Self { key: src, volume },
        }
    }
}

/// A presentation change requested by a node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Playback timing; `None` means node start.
    #[serde(default)]
    pub timing: Option<Timing>,
    /// Visibility predicate.
    #[serde(rename = "if", default)]
    pub condition: Option<Predicate>,
    /// Background key.
    #[serde(default)]
    pub background: Option<String>,
    /// Soundtrack key.
    #[serde(default)]
    pub soundtrack: Option<String>,
    /// One-shot sound effects.
    #[serde(default, deserialize_with = "one_or_many")]
    pub sound_effect: Vec<SoundEffect>,
    /// Stop the background track.
    #[serde(default)]
    pub stop_soundtrack: bool,
    /// Vignette darkness.
    #[serde(default)]
    pub vignette_dark_factor: Option<f64>,
    /// Left portrait key.
    #[serde(default)]
    pub portrait_left: Option<String>,
    /// Right portrait key.
    #[serde(default)]
    pub portrait_right: Option<String>,
}

impl Effect {
    /// Effective timing of this effect.
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing.unwrap_or(Timing::NodeStart)
    }
}

/// One entry of an ordered flag patch list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub enum PatchEntry {
    /// An unconditional partial flag map.
    Plain(Flags),
    /// A patch gated by a predicate. `set` is `None` when the document
    /// omitted the patch body, which is a content defect.
    Conditional {
        /// Gate evaluated when the entry is reached.
        condition: Predicate,
        /// The patch body.
        set: Option<Flags>,
    },
}

impl PatchEntry {
    /// Flag names this entry writes.
    pub fn written_keys(&self) -> impl Iterator<Item = &str> {
        let flags = match self {
            Self::Plain(flags) => Some(flags),
            Self::Conditional { set, .. } => set.as_ref(),
        };
        flags.into_iter().flat_map(Flags::keys)
    }
}

impl TryFrom<Map<String, Value>> for PatchEntry {
    type Error = serde_json::Error;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let gated = matches!(map.get("if"), Some(Value::Object(_)))
            || matches!(map.get("set"), Some(Value::Object(_)));
        if !gated {
            return serde_json::from_value(Value::Object(map)).map(Self::Plain);
        }
        let condition = match map.remove("if") {
            Some(value) => serde_json::from_value(value)?,
            None => Predicate::default(),
        };
        let set = map.remove("set").map(serde_json::from_value).transpose()?;
        Ok(Self::Conditional { condition, set })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tapestry_core::flags::FlagValue;

    fn node(value: Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_dialogue_node_carries_speaker() {
        let node = node(json!({
            "type": "dialogue",
            "speaker": "Wyll",
            "text": "Hello.",
            "end": true
        }));

        assert_eq!(node.speaker(), Some("Wyll"));
        assert_eq!(node.text, vec!["Hello.".to_owned()]);
        assert_eq!(node.line_style(), LineStyle::Dialogue);
    }

    #[test]
    fn test_narration_node_has_no_speaker() {
        let node = node(json!({ "type": "narration", "text": ["a", "b"], "autoNext": "x" }));

        assert_eq!(node.speaker(), None);
        assert_eq!(node.text.len(), 2);
        assert_eq!(node.auto_next(), Some("x"));
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result: Result<Node, _> = serde_json::from_value(json!({ "type": "cutscene" }));

        assert!(result.is_err());
    }

    #[test]
    fn test_patch_entries_distinguish_plain_and_conditional() {
        let node = node(json!({
            "type": "system",
            "end": true,
            "earlySet": [
                { "seen": true },
                { "if": { "seen": true }, "set": { "count": 2 } },
                { "if": { "seen": false } }
            ]
        }));

        assert_eq!(
            node.early_set[0],
            PatchEntry::Plain([("seen", true)].into_iter().collect())
        );
        match &node.early_set[1] {
            PatchEntry::Conditional { set: Some(set), .. } => {
                assert_eq!(set.get("count"), Some(&FlagValue::Number(2.0)));
            }
            other => panic!("expected conditional entry, got {other:?}"),
        }
        assert!(matches!(
            node.early_set[2],
            PatchEntry::Conditional { set: None, .. }
        ));
    }

    #[test]
    fn test_choice_set_accepts_single_map() {
        let choice: Choice = serde_json::from_value(json!({
            "text": "Go",
            "next": "b",
            "set": { "went": true }
        }))
        .unwrap();

        assert_eq!(choice.set.len(), 1);
    }

    #[test]
    fn test_sound_effect_accepts_key_spec_and_lists() {
        let effect: Effect = serde_json::from_value(json!({
            "timing": "textEnd",
            "soundEffect": ["door", { "src": "thunder", "volume": 0.4 }]
        }))
        .unwrap();

        assert_eq!(effect.timing(), Timing::TextEnd);
        assert_eq!(effect.sound_effect[0].key, "door");
        assert_eq!(effect.sound_effect[1].volume, Some(0.4));
    }

    #[test]
    fn test_untagged_effect_defaults_to_node_start() {
        let effect: Effect = serde_json::from_value(json!({ "background": "hall" })).unwrap();

        assert_eq!(effect.timing(), Timing::NodeStart);
    }
}
