//! Recording text stage.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tapestry_core::presentation::{ChoiceView, LineStyle, Region, Stage};
use tokio::time::Instant;

/// One call observed by [`RecordingStage`].
#[derive(Debug, Clone, PartialEq)]
pub enum StageCall {
    /// `fade_out_regions`
    FadeOut(Duration),
    /// `prepare_lines`
    PrepareLines {
        /// Target region.
        region: Region,
        /// Staged lines.
        lines: Vec<String>,
        /// Line styling.
        style: LineStyle,
    },
    /// `prepare_choices`
    PrepareChoices(Vec<ChoiceView>),
    /// `reveal_element`
    Reveal {
        /// Region of the element.
        region: Region,
        /// Element index within the region.
        index: usize,
        /// Fade duration; zero when shown instantly.
        fade: Duration,
    },
    /// `show_speaker`
    Speaker {
        /// Speaker label.
        name: String,
        /// Fade duration.
        fade: Duration,
    },
    /// `show_continue`
    Continue(Duration),
}

/// A stage call stamped with the runtime's (possibly paused) clock.
#[derive(Debug, Clone)]
pub struct StageEvent {
    /// When the call happened.
    pub at: Instant,
    /// The call itself.
    pub call: StageCall,
}

/// A stage that records every call with a timestamp.
#[derive(Debug, Clone, Default)]
pub struct RecordingStage {
    events: Arc<Mutex<Vec<StageEvent>>>,
}

impl RecordingStage {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns every recorded call without timestamps.
    #[must_use]
    pub fn calls(&self) -> Vec<StageCall> {
        self.events().into_iter().map(|event| event.call).collect()
    }

    /// Reveals in `region`, as `(at, index, fade)` triples.
    #[must_use]
    pub fn reveals(&self, region: Region) -> Vec<(Instant, usize, Duration)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event.call {
                StageCall::Reveal {
                    region: r,
                    index,
                    fade,
                } if r == region => Some((event.at, index, fade)),
                _ => None,
            })
            .collect()
    }

    /// Lines most recently prepared for `region`.
    #[must_use]
    pub fn prepared_lines(&self, region: Region) -> Option<Vec<String>> {
        self.calls().into_iter().rev().find_map(|call| match call {
            StageCall::PrepareLines { region: r, lines, .. } if r == region => Some(lines),
            _ => None,
        })
    }

    /// Forgets everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, call: StageCall) {
        self.events.lock().unwrap().push(StageEvent {
            at: Instant::now(),
            call,
        });
    }
}

impl Stage for RecordingStage {
    fn fade_out_regions(&mut self, duration: Duration) {
        self.push(StageCall::FadeOut(duration));
    }

    fn prepare_lines(&mut self, region: Region, lines: &[String], style: LineStyle) {
        self.push(StageCall::PrepareLines {
            region,
            lines: lines.to_vec(),
            style,
        });
    }

    fn prepare_choices(&mut self, choices: &[ChoiceView]) {
        self.push(StageCall::PrepareChoices(choices.to_vec()));
    }

    fn reveal_element(&mut self, region: Region, index: usize, fade: Duration) {
        self.push(StageCall::Reveal {
            region,
            index,
            fade,
        });
    }

    fn show_speaker(&mut self, speaker: &str, fade: Duration) {
        self.push(StageCall::Speaker {
            name: speaker.to_owned(),
            fade,
        });
    }

    fn show_continue(&mut self, fade: Duration) {
        self.push(StageCall::Continue(fade));
    }
}
