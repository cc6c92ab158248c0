//! Tapestry CLI — plays a narrative document in the terminal.
//!
//! The binary is a thin wrapper around [`run`]; everything else lives here
//! so integration tests can drive a full session with scripted input and a
//! captured console.

pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod telemetry;
pub mod terminal;

pub use config::Cli;
pub use driver::{drive, run};
pub use error::AppError;
pub use input::{Command, InputSource, ScriptedInput, StdinInput};
pub use terminal::{Console, TerminalStage, TerminalSurface, TracingHistory};
