//! End-to-end sessions of the terminal player.

mod common;

use common::{DocumentFile, cli, play};
use tapestry_cli::AppError;
use tapestry_content::ContentError;
use tapestry_narrative::PlaybackOutcome;
use tapestry_test_support::fixtures;

#[tokio::test(start_paused = true)]
async fn test_branching_session_reaches_the_end() {
    // Arrange
    let document = DocumentFile::json(&fixtures::branching_json());
    let cli = cli(&document, &[]);

    // Act
    let (outcome, output) = play(&cli, &["2"]).await;

    // Assert
    assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
    assert!(output.contains("  1. Go to A\n  2. Go to B\n"));
    assert!(output.contains("Ven:\n  \u{201c}A detour.\u{201d}\n"));
    assert!(output.contains("The end of the road.\n-- The End --\n"));
    assert!(output.contains("path=1X"));
    assert!(output.contains("version=1"));
}

#[tokio::test(start_paused = true)]
async fn test_resume_link_replays_silently() {
    // Arrange
    let document = DocumentFile::json(&fixtures::branching_json());
    let cli = cli(&document, &["--resume", "path=1&version=1", "--no-animations"]);

    // Act
    let (outcome, output) = play(&cli, &[]).await;

    // Assert
    assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
    assert!(!output.contains("Go to A"));
    assert!(output.contains("The end of the road."));
    assert!(!output.contains("another version"));
}

#[tokio::test(start_paused = true)]
async fn test_broken_link_is_reported_and_play_goes_on() {
    let document = DocumentFile::json(&fixtures::branching_json());
    let cli = cli(&document, &["--resume", "path=5&version=0", "--no-animations"]);

    let (outcome, output) = play(&cli, &["1"]).await;

    assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
    assert!(output.contains("another version"));
    assert!(output.contains("(the link could not be followed to the end"));
    assert!(output.contains("The end of the road."));
}

#[tokio::test(start_paused = true)]
async fn test_call_for_continue_waits_for_enter() {
    // Arrange
    let document = DocumentFile::json(&fixtures::showcase_json());
    let cli = cli(&document, &["--speed", "0"]);

    // Act
    let (waiting, before) = play(&cli, &[]).await;
    let (chosen, after) = play(&cli, &["", "1"]).await;

    // Assert
    assert_eq!(waiting.unwrap(), PlaybackOutcome::AwaitingContinue);
    assert!(before.contains("(press Enter to continue)"));
    assert!(before.contains("[scene: harbor]"));
    assert_eq!(chosen.unwrap(), PlaybackOutcome::Ended);
    assert!(after.contains("  1. [Calm] Stay\n"));
    assert!(after.contains("[scene: night]"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_asset_is_reported_in_the_console() {
    let document = DocumentFile::json(&fixtures::showcase_json());
    let cli = cli(&document, &["--no-animations"]);

    let (outcome, output) = play(&cli, &["", "2"]).await;

    assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
    assert!(output.contains("[asset nowhere is missing from backgrounds]"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_document_fails_before_playback() {
    // Arrange
    let document = DocumentFile::write(
        "yaml",
        "meta: { title: Broken }\nstart: nowhere\nnodes:\n  a: { type: narration, end: true }\n",
    );
    let cli = cli(&document, &[]);

    // Act
    let (outcome, output) = play(&cli, &["1"]).await;

    // Assert
    assert!(matches!(outcome, Err(AppError::Content(ContentError::Invalid(_)))));
    assert!(output.is_empty());
}
