//! Recording history sink.

use std::sync::{Arc, Mutex};

use tapestry_core::presentation::{HistoryEntry, HistorySink};

/// A history sink that keeps every recorded entry in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingHistory {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
    clears: Arc<Mutex<usize>>,
}

impl RecordingHistory {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the entries recorded since the last clear.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of times the panel was cleared.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        *self.clears.lock().unwrap()
    }
}

impl HistorySink for RecordingHistory {
    fn record(&mut self, entry: &HistoryEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }

    fn clear(&mut self) {
        self.entries.lock().unwrap().clear();
        *self.clears.lock().unwrap() += 1;
    }
}
