//! Command-line arguments and playback configuration.

use std::path::{Path, PathBuf};

use clap::Parser;
use tapestry_content::DocumentFormat;
use tapestry_narrative::{ContinuationPolicy, PlaybackConfig, SkipPolicy};

use crate::error::AppError;

/// Play a branching narrative document in the terminal.
#[derive(Debug, Clone, Parser)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "tapestry", version, about)]
pub struct Cli {
    /// Content document to play (`.json`, `.yaml` or `.yml`).
    pub document: PathBuf,

    /// Resume from a session query string, e.g. `path=1X&flags=met-true`.
    #[arg(long, value_name = "QUERY")]
    pub resume: Option<String>,

    /// Playback configuration file (JSON or YAML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Duration multiplier; `0` plays without pauses.
    #[arg(long, env = "TAPESTRY_SPEED")]
    pub speed: Option<f64>,

    /// Wait for Enter on every linear node.
    #[arg(long)]
    pub always_continue: bool,

    /// A skip completes every remaining reveal of the node.
    #[arg(long)]
    pub sticky_skip: bool,

    /// Show every node at once.
    #[arg(long)]
    pub no_animations: bool,

    /// Emit logs as JSON.
    #[arg(long, env = "TAPESTRY_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Builds the playback configuration: the configuration file if one is
    /// given, otherwise the defaults, with command-line options on top.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read and
    /// `AppError::Config` if it cannot be parsed or `--speed` is negative.
    pub fn playback_config(&self) -> Result<PlaybackConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => PlaybackConfig::default(),
        };

        if let Some(speed) = self.speed {
            if !speed.is_finite() || speed < 0.0 {
                return Err(AppError::Config(format!("speed must be a non-negative number, got {speed}")));
            }
            config.speed = speed;
        }
        if self.always_continue {
            config.continuation_policy = ContinuationPolicy::Always;
        }
        if self.sticky_skip {
            config.skip_policy = SkipPolicy::Sticky;
        }
        if self.no_animations {
            config.animations_enabled = false;
        }
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<PlaybackConfig, AppError> {
    let format = DocumentFormat::from_path(path).map_err(|e| AppError::Config(e.to_string()))?;
    let source = std::fs::read_to_string(path)?;
    let config = match format {
        DocumentFormat::Json => serde_json::from_str(&source).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(&source).map_err(|e| e.to_string()),
    };
    config.map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
}
