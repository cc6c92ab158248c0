//! Shared helpers for terminal player integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tapestry_cli::{AppError, Cli, Console, ScriptedInput, run};
use tapestry_narrative::PlaybackOutcome;

/// A document written to a unique temporary file, removed on drop.
pub struct DocumentFile {
    pub path: PathBuf,
}

impl DocumentFile {
    pub fn json(document: &Value) -> Self {
        Self::write("json", &serde_json::to_string_pretty(document).unwrap())
    }

    pub fn write(extension: &str, source: &str) -> Self {
        let path = std::env::temp_dir().join(format!("tapestry-{}.{extension}", uuid::Uuid::new_v4()));
        std::fs::write(&path, source).unwrap();
        Self { path }
    }
}

impl Drop for DocumentFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Parses `args` after the document path.
pub fn cli(document: &DocumentFile, args: &[&str]) -> Cli {
    let path = document.path.to_string_lossy().into_owned();
    Cli::try_parse_from(["tapestry", path.as_str()].into_iter().chain(args.iter().copied())).unwrap()
}

/// Runs a full session with scripted input and returns the outcome and
/// everything printed.
pub async fn play(cli: &Cli, script: &[&str]) -> (Result<PlaybackOutcome, AppError>, String) {
    let console = Console::buffer();
    let mut input = ScriptedInput::new(script.iter().copied());
    let outcome = run(cli, &console, &mut input).await;
    (outcome, console.contents())
}
