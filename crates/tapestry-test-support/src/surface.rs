//! Recording presentation surface.

use std::sync::{Arc, Mutex};

use tapestry_core::presentation::{Asset, PortraitSide, PresentationSurface};

/// One call observed by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    /// `show_background`
    Background {
        /// Asset key.
        key: String,
        /// Instant switch.
        instant: bool,
    },
    /// `crossfade_track`
    Track {
        /// Asset key.
        key: String,
        /// Instant switch.
        instant: bool,
    },
    /// `stop_track`
    StopTrack {
        /// Instant stop.
        instant: bool,
    },
    /// `play_one_shot`
    OneShot {
        /// Asset key.
        key: String,
        /// Clamped volume.
        volume: f64,
    },
    /// `set_portrait`
    Portrait {
        /// Slot.
        side: PortraitSide,
        /// Asset key, `None` when the slot is cleared.
        key: Option<String>,
    },
    /// `set_vignette`
    Vignette(f64),
}

/// A presentation surface that records every call.
///
/// Clones share the same log, so a test can keep one handle while the engine
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PresentationSurface for RecordingSurface {
    fn show_background(&mut self, asset: Asset<'_>, instant: bool) {
        self.push(SurfaceCall::Background {
            key: asset.key.to_owned(),
            instant,
        });
    }

    fn crossfade_track(&mut self, asset: Asset<'_>, instant: bool) {
        self.push(SurfaceCall::Track {
            key: asset.key.to_owned(),
            instant,
        });
    }

    fn stop_track(&mut self, instant: bool) {
        self.push(SurfaceCall::StopTrack { instant });
    }

    fn play_one_shot(&mut self, asset: Asset<'_>, volume: f64) {
        self.push(SurfaceCall::OneShot {
            key: asset.key.to_owned(),
            volume,
        });
    }

    fn set_portrait(&mut self, side: PortraitSide, asset: Option<Asset<'_>>) {
        self.push(SurfaceCall::Portrait {
            side,
            key: asset.map(|a| a.key.to_owned()),
        });
    }

    fn set_vignette(&mut self, intensity: f64) {
        self.push(SurfaceCall::Vignette(intensity));
    }
}
