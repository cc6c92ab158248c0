//! Fixture documents shared by the engine, session and CLI tests.

use std::sync::Arc;

use serde_json::{Value, json};
use tapestry_content::ContentDocument;

fn build(value: Value) -> Arc<ContentDocument> {
    Arc::new(serde_json::from_value(value).expect("fixture document must deserialize"))
}

/// `start` offers two choices: `0` ends at `A`, `1` sets `tookB` and goes to
/// `B`, which auto-advances to `A`.
#[must_use]
pub fn branching() -> Arc<ContentDocument> {
    build(branching_json())
}

/// Raw JSON of [`branching`], for loader and CLI tests.
#[must_use]
pub fn branching_json() -> Value {
    json!({
        "meta": { "title": "Branching", "version": "1" },
        "start": "start",
        "nodes": {
            "start": {
                "type": "narration",
                "text": "A fork in the road.",
                "choices": [
                    { "text": "Go to A", "next": "A" },
                    { "text": "Go to B", "next": "B", "set": { "tookB": true } }
                ]
            },
            "A": {
                "type": "narration",
                "text": "The end of the road.",
                "end": true
            },
            "B": {
                "type": "dialogue",
                "speaker": "Ven",
                "text": "A detour.",
                "autoNext": "A"
            }
        }
    })
}

/// Text variant fallback and patch ordering.
///
/// `start` carries `if` variants on either side of an `else`; `bare` has only
/// `if` variants and a base text.
#[must_use]
pub fn variants() -> Arc<ContentDocument> {
    build(json!({
        "meta": { "title": "Variants" },
        "start": "start",
        "nodes": {
            "start": {
                "type": "narration",
                "text": "Base text.",
                "textVariants": [
                    { "if": { "mood": "calm" }, "text": "Calm text." },
                    { "else": true, "text": "Fallback text." },
                    { "if": { "brave": true }, "text": ["Brave text.", "Second line."] }
                ],
                "earlySet": [
                    { "visits": 1 },
                    { "if": { "visits": 1 }, "set": { "counted": true } }
                ],
                "autoNext": "bare"
            },
            "bare": {
                "type": "narration",
                "text": "Bare base.",
                "textVariants": [
                    { "if": { "counted": false }, "text": "Never counted." }
                ],
                "end": true
            }
        }
    }))
}

/// Flag ordering within one node.
///
/// `s` sets `e` early and `l` late and offers one choice gated on each; only
/// the `e` choice resolves. `a` shows whether `l` reached it.
#[must_use]
pub fn gated() -> Arc<ContentDocument> {
    build(json!({
        "meta": { "title": "Gated" },
        "start": "s",
        "nodes": {
            "s": {
                "type": "narration",
                "text": "Two doors.",
                "earlySet": [{ "e": true }],
                "lateSet": [{ "l": true }],
                "choices": [
                    { "text": "Early door", "next": "a", "if": { "e": true } },
                    { "text": "Late door", "next": "a", "if": { "l": true } }
                ]
            },
            "a": {
                "type": "narration",
                "text": "Late flag missing.",
                "textVariants": [
                    { "if": { "l": true }, "text": "Late flag seen." }
                ],
                "end": true
            }
        }
    }))
}

/// Two nodes auto-advancing into each other forever.
#[must_use]
pub fn cyclic() -> Arc<ContentDocument> {
    build(json!({
        "meta": { "title": "Cycle" },
        "start": "a",
        "nodes": {
            "a": { "type": "narration", "text": "Ping.", "autoNext": "b" },
            "b": { "type": "narration", "text": "Pong.", "autoNext": "a" }
        }
    }))
}

/// A single terminal node with five body paragraphs.
#[must_use]
pub fn five_paragraphs() -> Arc<ContentDocument> {
    build(json!({
        "meta": { "title": "Paragraphs" },
        "start": "start",
        "nodes": {
            "start": {
                "type": "narration",
                "text": ["One.", "Two.", "Three.", "Four.", "Five."],
                "end": true
            }
        }
    }))
}

/// Exercises effects at every timing, predialogue, continuation and portraits.
#[must_use]
pub fn showcase() -> Arc<ContentDocument> {
    build(showcase_json())
}

/// Raw JSON of [`showcase`].
#[must_use]
pub fn showcase_json() -> Value {
    json!({
        "meta": { "title": "Showcase", "version": "3" },
        "assets": {
            "backgrounds": { "harbor": "img/harbor.png", "night": "img/night.png" },
            "soundtracks": { "tide": "audio/tide.ogg" },
            "soundEffects": { "bell": "audio/bell.ogg" },
            "portraits": { "ven": "img/ven.png", "mara": "img/mara.png" }
        },
        "start": "intro",
        "nodes": {
            "intro": {
                "type": "narration",
                "predialogue": { "text": "Years later..." },
                "text": ["The harbor is quiet.", "Fog rolls in."],
                "effects": [
                    { "background": "harbor", "soundtrack": "tide" },
                    { "portraitLeft": "ven" },
                    { "timing": "textEnd", "soundEffect": { "src": "bell", "volume": 1.5 } }
                ],
                "earlySet": [ { "visitedHarbor": true } ],
                "callForContinue": true,
                "autoNext": "meet"
            },
            "meet": {
                "type": "dialogue",
                "speaker": "Ven",
                "text": "You came back.",
                "textVariants": [
                    { "if": { "visitedHarbor": true }, "text": "Back to the harbor, then." },
                    { "else": true, "text": "Who are you?" }
                ],
                "effects": [
                    { "portraitRight": "mara" },
                    { "timing": "choicesStart", "vignetteDarkFactor": 2.0 }
                ],
                "choices": [
                    { "text": "Stay", "context": "Calm", "next": "stay", "set": { "stayed": true } },
                    { "text": "Leave", "next": "leave", "if": { "visitedHarbor": true } },
                    { "text": "Hidden", "next": "leave", "if": { "secret": true } }
                ]
            },
            "stay": {
                "type": "narration",
                "text": "You stay.",
                "effects": [ { "stopSoundtrack": true, "background": "night" } ],
                "lateSet": [ { "if": { "stayed": true }, "set": { "ending": "stay" } } ],
                "end": true
            },
            "leave": {
                "type": "system",
                "text": "You leave.",
                "effects": [ { "background": "nowhere" } ],
                "end": true
            }
        }
    })
}
