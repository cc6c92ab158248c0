//! Presentation collaborators.
//!
//! The engine never draws, plays audio or builds UI itself. It drives three
//! external collaborators through these traits:
//!
//! - [`PresentationSurface`] — backgrounds, soundtrack, one-shot sounds,
//!   portraits and vignette;
//! - [`Stage`] — the text regions revealed during playback;
//! - [`HistorySink`] — the append-only history panel.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved asset: the logical key used by content and the opaque resource
/// reference it maps to in the document's asset tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset<'a> {
    /// Logical key as written in the content document.
    pub key: &'a str,
    /// Opaque resource reference (file path, URL, ...).
    pub resource: &'a str,
}

/// Portrait slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortraitSide {
    /// Left portrait slot.
    Left,
    /// Right portrait slot.
    Right,
}

/// Audio/visual surface. Switching tracks or images is last-write-wins.
pub trait PresentationSurface: Send {
    /// Replaces the background image.
    fn show_background(&mut self, asset: Asset<'_>, instant: bool);

    /// Crossfades to a looping background track.
    fn crossfade_track(&mut self, asset: Asset<'_>, instant: bool);

    /// Stops the background track.
    fn stop_track(&mut self, instant: bool);

    /// Plays a one-shot sound effect. `volume` is within `[0, 1]`.
    fn play_one_shot(&mut self, asset: Asset<'_>, volume: f64);

    /// Shows a portrait in `side`, or hides the slot when `asset` is `None`.
    fn set_portrait(&mut self, side: PortraitSide, asset: Option<Asset<'_>>);

    /// Sets the vignette darkness. `intensity` is within `[0, 1]`.
    fn set_vignette(&mut self, intensity: f64);
}

/// A text region of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Secondary text shown before the speaker.
    Predialogue,
    /// Speaker label.
    Speaker,
    /// Body text.
    Text,
    /// Choice controls.
    Choices,
    /// Continue control.
    Continue,
}

/// How body lines should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Narrator voice.
    Narration,
    /// Spoken by a character.
    Dialogue,
    /// Meta/system message.
    System,
}

/// A choice as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    /// Position within the resolved choice list.
    pub index: usize,
    /// Display text.
    pub text: String,
    /// Optional bracketed context label.
    pub context: Option<String>,
    /// Narrative-styled choice (presentation only).
    pub narrative: bool,
}

/// The text stage revealed phase by phase during playback.
///
/// Elements are staged hidden by `prepare_*` calls and made visible one at a
/// time by [`Stage::reveal_element`].
pub trait Stage: Send {
    /// Fades out every region of the previous node.
    fn fade_out_regions(&mut self, duration: Duration);

    /// Stages `lines` hidden in `region`.
    fn prepare_lines(&mut self, region: Region, lines: &[String], style: LineStyle);

    /// Stages hidden choice controls.
    fn prepare_choices(&mut self, choices: &[ChoiceView]);

    /// Fades in one staged element. A zero `fade` shows it instantly.
    fn reveal_element(&mut self, region: Region, index: usize, fade: Duration);

    /// Fades in the speaker label.
    fn show_speaker(&mut self, speaker: &str, fade: Duration);

    /// Fades in the continue control.
    fn show_continue(&mut self, fade: Duration);
}

/// One rendered block of the history panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Node that produced this block.
    pub node_id: String,
    /// Speaker, or `None` for narration and predialogue.
    pub speaker: Option<String>,
    /// Resolved lines.
    pub lines: Vec<String>,
    /// When the block was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only sink for history entries.
pub trait HistorySink: Send {
    /// Records one entry.
    fn record(&mut self, entry: &HistoryEntry);

    /// Clears the panel on reset or replay.
    fn clear(&mut self);
}

/// A collaborator that discards everything. Backs headless replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl PresentationSurface for Headless {
    fn show_background(&mut self, _asset: Asset<'_>, _instant: bool) {}
    fn crossfade_track(&mut self, _asset: Asset<'_>, _instant: bool) {}
    fn stop_track(&mut self, _instant: bool) {}
    fn play_one_shot(&mut self, _asset: Asset<'_>, _volume: f64) {}
    fn set_portrait(&mut self, _side: PortraitSide, _asset: Option<Asset<'_>>) {}
    fn set_vignette(&mut self, _intensity: f64) {}
}

impl Stage for Headless {
    fn fade_out_regions(&mut self, _duration: Duration) {}
    fn prepare_lines(&mut self, _region: Region, _lines: &[String], _style: LineStyle) {}
    fn prepare_choices(&mut self, _choices: &[ChoiceView]) {}
    fn reveal_element(&mut self, _region: Region, _index: usize, _fade: Duration) {}
    fn show_speaker(&mut self, _speaker: &str, _fade: Duration) {}
    fn show_continue(&mut self, _fade: Duration) {}
}

impl HistorySink for Headless {
    fn record(&mut self, _entry: &HistoryEntry) {}
    fn clear(&mut self) {}
}
