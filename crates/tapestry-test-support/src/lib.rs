//! Shared test doubles and fixture documents for the Tapestry engine.

mod clock;
pub mod fixtures;
mod history;
mod stage;
mod surface;

pub use clock::{FixedClock, fixed_clock};
pub use history::RecordingHistory;
pub use stage::{RecordingStage, StageCall, StageEvent};
pub use surface::{RecordingSurface, SurfaceCall};
