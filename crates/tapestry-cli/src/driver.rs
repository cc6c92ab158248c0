//! The interactive session loop.

use std::future::Future;
use std::sync::Arc;

use tapestry_content::load_document;
use tapestry_core::clock::SystemClock;
use tapestry_core::error::EngineError;
use tapestry_narrative::{Orchestrator, PlaybackControls, PlaybackOutcome, Playthrough};
use tapestry_session::{ResumePlan, SessionParams, resume, snapshot};
use tracing::{debug, info, instrument};

use crate::config::Cli;
use crate::error::AppError;
use crate::input::{Command, InputSource};
use crate::terminal::{Console, TerminalStage, TerminalSurface, TracingHistory};

const HELP: &str = "(type a choice number, Enter to continue, h for history, l for a link, r to restart, q to quit)";

/// Loads the document named by `cli`, resumes the requested session and
/// plays it until the input is exhausted or the player quits.
///
/// # Errors
///
/// Returns `AppError::Content` if the document cannot be loaded,
/// `AppError::Config` for bad playback settings and `AppError::Engine` if
/// playback reaches a node the document does not contain.
#[instrument(skip_all, fields(document = %cli.document.display()))]
pub async fn run(cli: &Cli, console: &Console, input: &mut dyn InputSource) -> Result<PlaybackOutcome, AppError> {
    let config = cli.playback_config()?;
    let loaded = load_document(&cli.document)?;
    let document = Arc::new(loaded.document);

    let params = cli.resume.as_deref().map(SessionParams::from_query).unwrap_or_default();
    let plan = ResumePlan::from_params(&document, &params);
    if plan.version_mismatch {
        console.line("(this link was made for another version of the story; it may not line up)");
    }

    let playthrough = Playthrough::new(
        Arc::clone(&document),
        plan.premise.clone(),
        Arc::new(SystemClock),
        Box::new(TracingHistory),
    );
    info!(session = %playthrough.id(), title = %document.meta.title, "session starting");
    let mut orchestrator = Orchestrator::new(
        playthrough,
        Box::new(TerminalSurface::new(console.clone())),
        Box::new(TerminalStage::new(console.clone())),
        config,
    );

    if !document.meta.title.is_empty() {
        console.line(format!("== {} ==", document.meta.title));
    }
    let controls = orchestrator.controls();
    let resumed = with_skip(resume(&mut orchestrator, &plan), &controls, input).await?;
    if let Some(defect) = resumed.replay.and_then(|replay| replay.defect) {
        console.line(format!("(the link could not be followed to the end: {defect})"));
    }

    drive(&mut orchestrator, input, console, resumed.outcome).await
}

/// Reads commands and feeds them to `orchestrator` until the input is
/// exhausted or the player quits. `outcome` is where playback currently
/// rests. Returns the outcome playback rests at when the loop stops.
///
/// # Errors
///
/// Returns `AppError::Engine` for engine errors other than rejected input.
pub async fn drive(
    orchestrator: &mut Orchestrator,
    input: &mut dyn InputSource,
    console: &Console,
    mut outcome: PlaybackOutcome,
) -> Result<PlaybackOutcome, AppError> {
    let controls = orchestrator.controls();
    settle(orchestrator, console, &outcome);
    loop {
        let Some(line) = input.next_line().await else {
            debug!("input exhausted");
            return Ok(outcome);
        };
        let result = match Command::parse(&line) {
            Command::Choose(index) => with_skip(orchestrator.choose(index), &controls, input).await,
            Command::Continue => with_skip(orchestrator.advance(), &controls, input).await,
            Command::Reset => with_skip(orchestrator.reset(), &controls, input).await,
            Command::History => {
                print_history(orchestrator, console);
                continue;
            }
            Command::Link => {
                console.line(format!("?{}", snapshot(orchestrator).to_query()));
                continue;
            }
            Command::Quit => return Ok(outcome),
            Command::Unknown(_) => {
                console.line(HELP);
                continue;
            }
        };

        match result {
            Ok(next) => {
                outcome = next;
                settle(orchestrator, console, &outcome);
            }
            Err(EngineError::NoPendingInput(_)) => console.line("(nothing to continue; pick a choice or press r)"),
            Err(EngineError::ChoiceOutOfRange { available, .. }) => {
                console.line(format!("(pick a number between 1 and {available})"));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Reports what happened while playback ran: missing assets, and the end
/// of the story together with a link back to it.
fn settle(orchestrator: &mut Orchestrator, console: &Console, outcome: &PlaybackOutcome) {
    for defect in orchestrator.take_presentation_defects() {
        console.line(format!("[{defect}]"));
    }
    if *outcome == PlaybackOutcome::Ended {
        console.line("-- The End --");
        console.line(format!("?{}", snapshot(orchestrator).to_query()));
    }
}

fn print_history(orchestrator: &Orchestrator, console: &Console) {
    console.line("-- history --");
    for entry in &orchestrator.playthrough().state().history {
        for line in &entry.lines {
            match &entry.speaker {
                Some(speaker) => console.line(format!("{speaker}: {line}")),
                None => console.line(line),
            }
        }
    }
    console.line("--");
}

/// Awaits `playback`. While it runs, every line typed on an interactive
/// input skips the current reveal instead of being read as a command.
async fn with_skip<F>(playback: F, controls: &PlaybackControls, input: &mut dyn InputSource) -> F::Output
where
    F: Future,
{
    if !input.is_interactive() {
        return playback.await;
    }
    tokio::pin!(playback);
    loop {
        tokio::select! {
            output = &mut playback => return output,
            line = input.next_line() => {
                if line.is_none() {
                    return playback.await;
                }
                if controls.skip() {
                    debug!("reveal skipped");
                }
            }
        }
    }
}
