//! Session context shared by replay and playback.

use std::fmt;
use std::sync::Arc;

use tapestry_content::{ContentDocument, Node};
use tapestry_core::clock::Clock;
use tapestry_core::error::EngineError;
use tapestry_core::flags::Flags;
use tapestry_core::presentation::{HistoryEntry, HistorySink};
use uuid::Uuid;

use crate::domain::path::Path;

/// Mutable state of one playthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// The node most recently rendered.
    pub current_node_id: String,
    /// Accumulated flags.
    pub flags: Flags,
    /// Rendered blocks, oldest first. Only grows until the next reset.
    pub history: Vec<HistoryEntry>,
}

/// Everything a session needs besides its presentation collaborators: the
/// document, the premise flags it started from, the game state and the
/// decisions taken so far.
pub struct Playthrough {
    id: Uuid,
    document: Arc<ContentDocument>,
    premise: Flags,
    state: GameState,
    path: Path,
    clock: Arc<dyn Clock>,
    history: Box<dyn HistorySink>,
}

impl Playthrough {
    /// Creates a playthrough positioned on the document's start node with
    /// the premise flags applied.
    #[must_use]
    pub fn new(
        document: Arc<ContentDocument>,
        premise: Flags,
        clock: Arc<dyn Clock>,
        history: Box<dyn HistorySink>,
    ) -> Self {
        let state = GameState {
            current_node_id: document.start.clone(),
            flags: premise.clone(),
            history: Vec::new(),
        };
        Self {
            id: Uuid::new_v4(),
            document,
            premise,
            state,
            path: Path::new(),
            clock,
            history,
        }
    }

    /// Identifier used to correlate log lines of this session.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The document being played.
    #[must_use]
    pub fn document(&self) -> &Arc<ContentDocument> {
        &self.document
    }

    /// Looks up a node of the document.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NodeNotFound` if `id` is not in the document.
    pub fn node(&self, id: &str) -> Result<&Node, EngineError> {
        self.document
            .node(id)
            .ok_or_else(|| EngineError::NodeNotFound(id.to_owned()))
    }

    /// Flags the session started from.
    #[must_use]
    pub fn premise(&self) -> &Flags {
        &self.premise
    }

    /// Current game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> &Flags {
        &self.state.flags
    }

    /// Current flags, for patching.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.state.flags
    }

    /// The node most recently rendered.
    #[must_use]
    pub fn current_node_id(&self) -> &str {
        &self.state.current_node_id
    }

    /// Marks `id` as the node being rendered.
    pub fn set_current_node(&mut self, id: &str) {
        id.clone_into(&mut self.state.current_node_id);
    }

    /// Decisions taken so far.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decisions taken so far, for recording.
    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    /// Returns to the start node with the premise flags, an empty path and
    /// a cleared history.
    pub fn reset(&mut self) {
        self.state.current_node_id.clone_from(&self.document.start);
        self.state.flags = self.premise.clone();
        self.state.history.clear();
        self.history.clear();
        self.path.clear();
    }

    /// Appends the history blocks of a rendered node: the predialogue block
    /// when non-empty, then the content block.
    pub fn record_node(&mut self, node_id: &str, speaker: Option<&str>, predialogue: &[String], text: &[String]) {
        if !predialogue.is_empty() {
            self.record(node_id, None, predialogue);
        }
        self.record(node_id, speaker, text);
    }

    fn record(&mut self, node_id: &str, speaker: Option<&str>, lines: &[String]) {
        let entry = HistoryEntry {
            node_id: node_id.to_owned(),
            speaker: speaker.map(str::to_owned),
            lines: lines.to_vec(),
            recorded_at: self.clock.now(),
        };
        self.history.record(&entry);
        self.state.history.push(entry);
    }
}

impl fmt::Debug for Playthrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playthrough")
            .field("id", &self.id)
            .field("title", &self.document.meta.title)
            .field("state", &self.state)
            .field("path", &self.path.encode())
            .finish_non_exhaustive()
    }
}
