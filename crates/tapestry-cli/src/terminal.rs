//! Terminal implementations of the presentation collaborators.
//!
//! Nothing here animates: a fade is just the moment a line is printed, so
//! the reveal cadence comes entirely from the orchestrator's timing.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tapestry_core::presentation::{
    Asset, ChoiceView, HistoryEntry, HistorySink, LineStyle, PortraitSide, PresentationSurface, Region, Stage,
};
use tracing::{debug, warn};

#[derive(Debug)]
enum Sink {
    Stdout,
    Buffer(String),
}

/// Line-oriented output shared by the stage, the surface and the driver.
#[derive(Debug, Clone)]
pub struct Console {
    sink: Arc<Mutex<Sink>>,
}

impl Console {
    /// A console printing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_sink(Sink::Stdout)
    }

    /// A console capturing everything in memory.
    #[must_use]
    pub fn buffer() -> Self {
        Self::with_sink(Sink::Buffer(String::new()))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes one line.
    pub fn line(&self, text: impl AsRef<str>) {
        match &mut *self.lock() {
            Sink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", text.as_ref()).and_then(|()| stdout.flush()) {
                    warn!(error = %e, "failed to write to stdout");
                }
            }
            Sink::Buffer(buffer) => {
                let _ = writeln!(buffer, "{}", text.as_ref());
            }
        }
    }

    /// Everything captured so far; empty for a stdout console.
    #[must_use]
    pub fn contents(&self) -> String {
        match &*self.lock() {
            Sink::Stdout => String::new(),
            Sink::Buffer(buffer) => buffer.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Staged {
    lines: Vec<String>,
    style: LineStyle,
}

/// Prints staged lines as they are revealed.
#[derive(Debug)]
pub struct TerminalStage {
    console: Console,
    staged: HashMap<Region, Staged>,
    choices: Vec<ChoiceView>,
}

impl TerminalStage {
    /// Creates a stage writing to `console`.
    #[must_use]
    pub fn new(console: Console) -> Self {
        Self {
            console,
            staged: HashMap::new(),
            choices: Vec::new(),
        }
    }
}

fn format_line(line: &str, style: LineStyle) -> String {
    match style {
        LineStyle::Narration => line.to_owned(),
        LineStyle::Dialogue => format!("  \u{201c}{line}\u{201d}"),
        LineStyle::System => format!("  * {line}"),
    }
}

fn format_choice(choice: &ChoiceView) -> String {
    let mut label = format!("  {}. ", choice.index + 1);
    if let Some(context) = &choice.context {
        let _ = write!(label, "[{context}] ");
    }
    if choice.narrative {
        let _ = write!(label, "({})", choice.text);
    } else {
        label.push_str(&choice.text);
    }
    label
}

impl Stage for TerminalStage {
    fn fade_out_regions(&mut self, _duration: Duration) {
        self.staged.clear();
        self.choices.clear();
        self.console.line("");
    }

    fn prepare_lines(&mut self, region: Region, lines: &[String], style: LineStyle) {
        self.staged.insert(
            region,
            Staged {
                lines: lines.to_vec(),
                style,
            },
        );
    }

    fn prepare_choices(&mut self, choices: &[ChoiceView]) {
        self.choices = choices.to_vec();
    }

    fn reveal_element(&mut self, region: Region, index: usize, _fade: Duration) {
        let line = match region {
            Region::Choices => self.choices.get(index).map(format_choice),
            // Predialogue reads as narration whatever the node's style.
            Region::Predialogue => self
                .staged
                .get(&region)
                .and_then(|staged| staged.lines.get(index))
                .map(|line| format_line(line, LineStyle::Narration)),
            _ => self
                .staged
                .get(&region)
                .and_then(|staged| staged.lines.get(index).map(|line| format_line(line, staged.style))),
        };
        match line {
            Some(line) => self.console.line(line),
            None => debug!(?region, index, "reveal of an element that was never staged"),
        }
    }

    fn show_speaker(&mut self, speaker: &str, _fade: Duration) {
        self.console.line(format!("{speaker}:"));
    }

    fn show_continue(&mut self, _fade: Duration) {
        self.console.line("  (press Enter to continue)");
    }
}

/// Describes surface changes as bracketed stage directions.
#[derive(Debug)]
pub struct TerminalSurface {
    console: Console,
}

impl TerminalSurface {
    /// Creates a surface writing to `console`.
    #[must_use]
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

fn side_name(side: PortraitSide) -> &'static str {
    match side {
        PortraitSide::Left => "left",
        PortraitSide::Right => "right",
    }
}

impl PresentationSurface for TerminalSurface {
    fn show_background(&mut self, asset: Asset<'_>, _instant: bool) {
        self.console.line(format!("[scene: {}]", asset.key));
    }

    fn crossfade_track(&mut self, asset: Asset<'_>, _instant: bool) {
        self.console.line(format!("[music: {}]", asset.key));
    }

    fn stop_track(&mut self, _instant: bool) {
        self.console.line("[music fades]");
    }

    fn play_one_shot(&mut self, asset: Asset<'_>, _volume: f64) {
        self.console.line(format!("[sound: {}]", asset.key));
    }

    fn set_portrait(&mut self, side: PortraitSide, asset: Option<Asset<'_>>) {
        // Clearing an empty slot is routine; only announce arrivals.
        if let Some(asset) = asset {
            self.console.line(format!("[{}: {}]", side_name(side), asset.key));
        }
    }

    fn set_vignette(&mut self, intensity: f64) {
        debug!(intensity, "vignette");
    }
}

/// History sink that only logs. The game state keeps the entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHistory;

impl HistorySink for TracingHistory {
    fn record(&mut self, entry: &HistoryEntry) {
        debug!(node = %entry.node_id, speaker = ?entry.speaker, lines = entry.lines.len(), "history entry");
    }

    fn clear(&mut self) {
        debug!("history cleared");
    }
}
