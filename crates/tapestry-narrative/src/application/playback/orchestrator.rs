//! The playback orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tapestry_content::Timing;
use tapestry_core::cancel::Cancellation;
use tapestry_core::error::EngineError;
use tapestry_core::presentation::{ChoiceView, LineStyle, PresentationSurface, Region, Stage};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use super::config::PlaybackConfig;
use super::reveal::{Reveal, Stagger, staggered};
use super::skip::SkipSignal;
use super::token::{RenderToken, RenderTokens};
use crate::application::effects::Effects;
use crate::application::playthrough::Playthrough;
use crate::application::render::{fire, prepare};
use crate::application::replay::{Reconstructor, ReplayOutcome};
use crate::domain::continuation::{Continuation, choice_views};
use crate::domain::defects::PresentationDefect;
use crate::domain::mutate::apply_patches;
use crate::domain::path::{Path, PathToken};

/// Where a playback invocation came to rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The node shows these choices; call [`Orchestrator::choose`].
    AwaitingChoice(Vec<ChoiceView>),
    /// The node shows the continue control; call [`Orchestrator::advance`].
    AwaitingContinue,
    /// The node is terminal.
    Ended,
    /// A newer invocation or an explicit supersede took over.
    Superseded,
}

/// Input the current node is waiting for.
#[derive(Debug, Clone)]
enum Pending {
    Nothing,
    Choice { node_id: String, declared: Vec<usize> },
    Continue { next: String },
}

/// Result of presenting one node.
enum Step {
    Settled(PlaybackOutcome),
    Advance(String),
}

/// Handle for interrupting playback from another task.
#[derive(Debug, Clone)]
pub struct PlaybackControls {
    tokens: Arc<RenderTokens>,
    skip: Arc<SkipSignal>,
    allow_skip: bool,
}

impl PlaybackControls {
    /// Asks the running reveal to show everything at once. Returns `false`
    /// when skipping is disabled.
    pub fn skip(&self) -> bool {
        if !self.allow_skip {
            return false;
        }
        self.skip.arm(self.tokens.current());
        true
    }

    /// Invalidates the running invocation. It stops at its next phase
    /// boundary and reports [`PlaybackOutcome::Superseded`].
    pub fn supersede(&self) {
        self.tokens.supersede();
    }
}

/// Drives a playthrough through timed, cancellable node presentations.
pub struct Orchestrator {
    playthrough: Playthrough,
    effects: Effects,
    stage: Box<dyn Stage>,
    config: PlaybackConfig,
    tokens: Arc<RenderTokens>,
    skip: Arc<SkipSignal>,
    pending: Pending,
    presented_any: bool,
}

impl Orchestrator {
    /// Creates an orchestrator for `playthrough`.
    #[must_use]
    pub fn new(
        playthrough: Playthrough,
        surface: Box<dyn PresentationSurface>,
        stage: Box<dyn Stage>,
        config: PlaybackConfig,
    ) -> Self {
        let skip = Arc::new(SkipSignal::new(config.skip_policy));
        Self {
            playthrough,
            effects: Effects::new(surface),
            stage,
            config,
            tokens: RenderTokens::new(),
            skip,
            pending: Pending::Nothing,
            presented_any: false,
        }
    }

    /// Returns a handle for skipping or superseding playback.
    #[must_use]
    pub fn controls(&self) -> PlaybackControls {
        PlaybackControls {
            tokens: Arc::clone(&self.tokens),
            skip: Arc::clone(&self.skip),
            allow_skip: self.config.allow_skip,
        }
    }

    /// The playthrough being played.
    #[must_use]
    pub fn playthrough(&self) -> &Playthrough {
        &self.playthrough
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Returns `true` while a choice or continue is expected.
    #[must_use]
    pub fn is_awaiting_input(&self) -> bool {
        !matches!(self.pending, Pending::Nothing)
    }

    /// Presentation defects reported since the last call.
    pub fn take_presentation_defects(&mut self) -> Vec<PresentationDefect> {
        self.effects.take_defects()
    }

    /// Plays the document's start node.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NodeNotFound` if a node on the way is missing.
    pub async fn start(&mut self) -> Result<PlaybackOutcome, EngineError> {
        let start = self.playthrough.document().start.clone();
        self.play(&start).await
    }

    /// Plays `node_id`, following auto-advances until the story waits for
    /// input, ends, or is superseded.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NodeNotFound` if a node on the way is missing.
    #[instrument(skip(self), fields(session = %self.playthrough.id()))]
    pub async fn play(&mut self, node_id: &str) -> Result<PlaybackOutcome, EngineError> {
        self.run_from(node_id.to_owned(), true).await
    }

    /// Like [`Orchestrator::play`], but the first node is not added to the
    /// history. Used to show the final node of a replay, whose history was
    /// already recorded silently.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NodeNotFound` if a node on the way is missing.
    #[instrument(skip(self), fields(session = %self.playthrough.id()))]
    pub async fn present(&mut self, node_id: &str, record_history: bool) -> Result<PlaybackOutcome, EngineError> {
        self.run_from(node_id.to_owned(), record_history).await
    }

    /// Takes choice `index` of the current node: applies its patch, records
    /// the index and plays its target.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoPendingInput` if the node is not waiting for a
    /// choice, `EngineError::ChoiceOutOfRange` for a bad index, and any
    /// error [`Orchestrator::play`] can return.
    #[instrument(skip(self), fields(session = %self.playthrough.id()))]
    pub async fn choose(&mut self, index: usize) -> Result<PlaybackOutcome, EngineError> {
        let Pending::Choice { node_id, declared } = &self.pending else {
            return Err(self.no_pending_input());
        };
        let Some(&position) = declared.get(index) else {
            return Err(EngineError::ChoiceOutOfRange {
                index,
                available: declared.len(),
            });
        };
        let document = Arc::clone(self.playthrough.document());
        let choice = document
            .node(node_id)
            .and_then(|node| node.choices.get(position))
            .ok_or_else(|| EngineError::NodeNotFound(node_id.clone()))?;

        self.pending = Pending::Nothing;
        apply_patches(self.playthrough.flags_mut(), &choice.set);
        self.playthrough.path_mut().push(PathToken::Choice(index));
        info!(choice = index, next = %choice.next, "choice taken");

        self.run_from(choice.next.clone(), true).await
    }

    /// Continues past a node waiting on its continue control.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoPendingInput` if the node is not waiting for
    /// a continue, and any error [`Orchestrator::play`] can return.
    #[instrument(skip(self), fields(session = %self.playthrough.id()))]
    pub async fn advance(&mut self) -> Result<PlaybackOutcome, EngineError> {
        let Pending::Continue { next } = &self.pending else {
            return Err(self.no_pending_input());
        };
        let next = next.clone();

        self.pending = Pending::Nothing;
        self.playthrough.path_mut().push(PathToken::Continue);
        info!(%next, "continued");

        self.run_from(next, true).await
    }

    /// Silently rebuilds the playthrough from `path`, superseding any
    /// running invocation. The final node is not presented; follow up with
    /// [`Orchestrator::present`].
    pub fn replay(&mut self, path: &Path) -> ReplayOutcome {
        self.tokens.supersede();
        self.pending = Pending::Nothing;
        Reconstructor::new().run(&mut self.playthrough, &mut self.effects, path)
    }

    /// Starts over: supersedes playback, restores the premise flags, clears
    /// history and presentation, and plays the start node.
    ///
    /// # Errors
    ///
    /// Returns any error [`Orchestrator::start`] can return.
    pub async fn reset(&mut self) -> Result<PlaybackOutcome, EngineError> {
        self.tokens.supersede();
        self.pending = Pending::Nothing;
        self.playthrough.reset();
        self.effects.reset();
        info!(session = %self.playthrough.id(), "playthrough reset");
        self.start().await
    }

    fn no_pending_input(&self) -> EngineError {
        EngineError::NoPendingInput(self.playthrough.current_node_id().to_owned())
    }

    async fn run_from(&mut self, mut node_id: String, mut record_history: bool) -> Result<PlaybackOutcome, EngineError> {
        loop {
            match self.present_node(&node_id, record_history).await? {
                Step::Settled(outcome) => return Ok(outcome),
                Step::Advance(next) => {
                    self.playthrough.path_mut().push(PathToken::Continue);
                    node_id = next;
                    record_history = true;
                }
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn present_node(&mut self, node_id: &str, record_history: bool) -> Result<Step, EngineError> {
        let document = Arc::clone(self.playthrough.document());
        let token = self.tokens.issue();
        self.skip.clear();
        self.pending = Pending::Nothing;
        info!(node = node_id, token = token.id(), "presenting node");

        // Preparing
        let prepared = prepare(
            &mut self.playthrough,
            &mut self.effects,
            &document,
            node_id,
            false,
            self.config.continuation_policy,
        )?;
        let node = prepared.node;
        let is_start = node_id == document.start;

        if self.presented_any {
            let fade_out = self.config.scaled(self.config.node_fade_out);
            self.stage.fade_out_regions(fade_out);
            pause(fade_out).await;
        }
        self.presented_any = true;
        if superseded(&token, "preparing") {
            return Ok(Step::Settled(PlaybackOutcome::Superseded));
        }

        let views = match &prepared.continuation {
            Continuation::Choices(choices) => choice_views(choices),
            _ => Vec::new(),
        };
        self.stage
            .prepare_lines(Region::Predialogue, &prepared.predialogue, LineStyle::Narration);
        self.stage
            .prepare_lines(Region::Text, &prepared.text, node.line_style());
        self.stage.prepare_choices(&views);

        // Revealing predialogue
        if !prepared.predialogue.is_empty() {
            debug!(phase = "predialogue");
            fire(&self.playthrough, &mut self.effects, &document, node, Timing::PredialogueStart);
            let timing = self.stagger(self.config.predialogue_stagger, self.config.paragraph_fade);
            if self.reveal(Region::Predialogue, prepared.predialogue.len(), timing, &token).await == Reveal::Superseded {
                return Ok(Step::Settled(PlaybackOutcome::Superseded));
            }
            fire(&self.playthrough, &mut self.effects, &document, node, Timing::PredialogueEnd);
            if superseded(&token, "predialogue") {
                return Ok(Step::Settled(PlaybackOutcome::Superseded));
            }
            if !is_start {
                pause(self.config.scaled(self.config.pause_after_predialogue)).await;
            }
        }

        // Revealing speaker
        if let Some(speaker) = node.speaker() {
            debug!(phase = "speaker");
            self.stage
                .show_speaker(speaker, self.config.scaled(self.config.node_fade_in));
            if superseded(&token, "speaker") {
                return Ok(Step::Settled(PlaybackOutcome::Superseded));
            }
        }

        // Revealing text
        if !prepared.text.is_empty() {
            debug!(phase = "text");
            fire(&self.playthrough, &mut self.effects, &document, node, Timing::TextStart);
            let timing = self.stagger(self.config.paragraph_stagger, self.config.paragraph_fade);
            if self.reveal(Region::Text, prepared.text.len(), timing, &token).await == Reveal::Superseded {
                return Ok(Step::Settled(PlaybackOutcome::Superseded));
            }
            fire(&self.playthrough, &mut self.effects, &document, node, Timing::TextEnd);
            if superseded(&token, "text") {
                return Ok(Step::Settled(PlaybackOutcome::Superseded));
            }
            if !is_start {
                pause(self.config.scaled(self.config.pause_after_text)).await;
            }
        }

        // Revealing choices or continuation
        debug!(phase = "continuation");
        let (outcome, pending) = match &prepared.continuation {
            Continuation::Choices(choices) => {
                fire(&self.playthrough, &mut self.effects, &document, node, Timing::ChoicesStart);
                let timing = self.stagger(self.config.choice_stagger, self.config.choice_fade);
                if self.reveal(Region::Choices, choices.len(), timing, &token).await == Reveal::Superseded {
                    return Ok(Step::Settled(PlaybackOutcome::Superseded));
                }
                let pending = Pending::Choice {
                    node_id: node_id.to_owned(),
                    declared: choices.iter().map(|choice| choice.declared).collect(),
                };
                (PlaybackOutcome::AwaitingChoice(views), pending)
            }
            Continuation::AwaitContinue { next } => {
                fire(&self.playthrough, &mut self.effects, &document, node, Timing::CallForContinue);
                let fade = self.config.scaled(self.config.continue_fade);
                self.stage.show_continue(fade);
                pause(fade).await;
                let pending = Pending::Continue {
                    next: (*next).to_owned(),
                };
                (PlaybackOutcome::AwaitingContinue, pending)
            }
            Continuation::AutoAdvance { next } => {
                if record_history {
                    self.playthrough
                        .record_node(node_id, node.speaker(), &prepared.predialogue, &prepared.text);
                }
                pause(self.config.scaled(self.config.pause_before_auto_next)).await;
                if superseded(&token, "auto-advance") {
                    return Ok(Step::Settled(PlaybackOutcome::Superseded));
                }
                return Ok(Step::Advance((*next).to_owned()));
            }
            Continuation::Terminal { .. } => (PlaybackOutcome::Ended, Pending::Nothing),
        };

        if superseded(&token, "continuation") {
            return Ok(Step::Settled(PlaybackOutcome::Superseded));
        }
        if record_history {
            self.playthrough
                .record_node(node_id, node.speaker(), &prepared.predialogue, &prepared.text);
        }
        self.pending = pending;
        Ok(Step::Settled(outcome))
    }

    fn stagger(&self, delay: u64, fade: u64) -> Stagger {
        Stagger {
            delay: self.config.scaled(delay),
            fade: self.config.scaled(fade),
        }
    }

    async fn reveal(&mut self, region: Region, count: usize, timing: Stagger, token: &RenderToken) -> Reveal {
        staggered(self.stage.as_mut(), region, count, timing, token, &self.skip).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("playthrough", &self.playthrough)
            .field("config", &self.config)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

fn superseded(token: &RenderToken, phase: &str) -> bool {
    let cancelled = token.is_cancelled();
    if cancelled {
        debug!(token = token.id(), phase, "playback superseded");
    }
    cancelled
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tapestry_content::ContentDocument;
    use tapestry_core::flags::Flags;
    use tapestry_test_support::{
        RecordingHistory, RecordingStage, RecordingSurface, StageCall, SurfaceCall, fixed_clock, fixtures,
    };
    use tokio::time::Instant;

    use super::super::skip::SkipPolicy;
    use super::*;

    struct Harness {
        orchestrator: Orchestrator,
        stage: RecordingStage,
        surface: RecordingSurface,
        history: RecordingHistory,
    }

    fn harness(document: Arc<ContentDocument>, config: PlaybackConfig) -> Harness {
        let stage = RecordingStage::new();
        let surface = RecordingSurface::new();
        let history = RecordingHistory::new();
        let playthrough = Playthrough::new(document, Flags::new(), fixed_clock(), Box::new(history.clone()));
        let orchestrator = Orchestrator::new(playthrough, Box::new(surface.clone()), Box::new(stage.clone()), config);
        Harness {
            orchestrator,
            stage,
            surface,
            history,
        }
    }

    fn reveal_timing(stagger: u64, fade: u64) -> PlaybackConfig {
        PlaybackConfig {
            paragraph_stagger: stagger,
            paragraph_fade: fade,
            ..PlaybackConfig::default()
        }
    }

    fn history_nodes(history: &RecordingHistory) -> Vec<String> {
        history.entries().into_iter().map(|entry| entry.node_id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_branching_story_plays_through_detour() {
        // Arrange
        let mut h = harness(fixtures::branching(), PlaybackConfig::default());

        // Act
        let first = h.orchestrator.start().await.unwrap();
        let last = h.orchestrator.choose(1).await.unwrap();

        // Assert
        match first {
            PlaybackOutcome::AwaitingChoice(views) => {
                assert_eq!(views.len(), 2);
                assert_eq!(views[1].text, "Go to B");
            }
            other => panic!("expected choices, got {other:?}"),
        }
        assert_eq!(last, PlaybackOutcome::Ended);
        let playthrough = h.orchestrator.playthrough();
        assert_eq!(playthrough.current_node_id(), "A");
        assert_eq!(playthrough.path().encode(), "1X");
        assert!(playthrough.flags().is_set("tookB"));
        assert_eq!(history_nodes(&h.history), vec!["start", "B", "A"]);
        assert!(!h.orchestrator.is_awaiting_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_is_rejected_when_none_is_pending() {
        // Arrange
        let mut h = harness(fixtures::branching(), PlaybackConfig::default());

        // Act
        let before_start = h.orchestrator.choose(0).await;
        h.orchestrator.start().await.unwrap();
        let continue_at_choice = h.orchestrator.advance().await;
        let out_of_range = h.orchestrator.choose(7).await;

        // Assert
        assert!(matches!(before_start, Err(EngineError::NoPendingInput(node)) if node == "start"));
        assert!(matches!(continue_at_choice, Err(EngineError::NoPendingInput(_))));
        assert!(matches!(
            out_of_range,
            Err(EngineError::ChoiceOutOfRange { index: 7, available: 2 })
        ));
        assert!(h.orchestrator.is_awaiting_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_for_continue_waits_for_advance() {
        // Arrange
        let mut h = harness(fixtures::showcase(), PlaybackConfig::default());

        // Act
        let first = h.orchestrator.start().await.unwrap();
        let second = h.orchestrator.advance().await.unwrap();

        // Assert
        assert_eq!(first, PlaybackOutcome::AwaitingContinue);
        match second {
            PlaybackOutcome::AwaitingChoice(views) => {
                let texts: Vec<&str> = views.iter().map(|view| view.text.as_str()).collect();
                assert_eq!(texts, vec!["Stay", "Leave"]);
                assert_eq!(views[0].context.as_deref(), Some("Calm"));
            }
            other => panic!("expected choices, got {other:?}"),
        }
        assert_eq!(h.orchestrator.playthrough().path().encode(), "X");
        assert_eq!(
            h.stage.prepared_lines(Region::Text),
            Some(vec!["Back to the harbor, then.".to_owned()])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_shows_remaining_lines_then_waits_one_fade() {
        // Arrange
        let mut h = harness(fixtures::five_paragraphs(), reveal_timing(150, 300));
        let controls = h.orchestrator.controls();
        let started = Instant::now();

        // Act
        let (outcome, skipped_at) = tokio::join!(h.orchestrator.start(), async {
            sleep(Duration::from_millis(200)).await;
            assert!(controls.skip());
            Instant::now()
        });
        let finished = Instant::now();

        // Assert
        assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
        let reveals = h.stage.reveals(Region::Text);
        let fades: Vec<Duration> = reveals.iter().map(|(_, _, fade)| *fade).collect();
        assert_eq!(
            fades,
            vec![
                Duration::from_millis(300),
                Duration::from_millis(300),
                Duration::ZERO,
                Duration::ZERO,
                Duration::ZERO,
            ]
        );
        assert!(reveals[2..].iter().all(|(at, _, _)| *at == skipped_at));
        assert!(finished - skipped_at >= Duration::from_millis(300));
        assert_eq!(finished - started, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unskipped_reveal_takes_every_stagger_and_one_fade() {
        let mut h = harness(fixtures::five_paragraphs(), reveal_timing(150, 300));
        let started = Instant::now();

        h.orchestrator.start().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(5 * 150 + 300));
        let indices: Vec<usize> = h.stage.reveals(Region::Text).iter().map(|(_, index, _)| *index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_is_refused_when_disabled() {
        // Arrange
        let config = PlaybackConfig {
            allow_skip: false,
            ..reveal_timing(150, 300)
        };
        let mut h = harness(fixtures::five_paragraphs(), config);
        let controls = h.orchestrator.controls();
        let started = Instant::now();

        // Act
        let (_, accepted) = tokio::join!(h.orchestrator.start(), async {
            sleep(Duration::from_millis(200)).await;
            controls.skip()
        });

        // Assert
        assert!(!accepted);
        assert_eq!(started.elapsed(), Duration::from_millis(1050));
    }

    fn two_phase_document() -> Arc<ContentDocument> {
        Arc::new(
            serde_json::from_value(json!({
                "meta": { "title": "Phases" },
                "start": "start",
                "nodes": {
                    "start": {
                        "type": "narration",
                        "predialogue": { "text": ["p1", "p2", "p3"] },
                        "text": ["t1", "t2", "t3"],
                        "end": true
                    }
                }
            }))
            .unwrap(),
        )
    }

    async fn skip_during_predialogue(policy: SkipPolicy) -> RecordingStage {
        let config = PlaybackConfig {
            skip_policy: policy,
            ..PlaybackConfig::default()
        };
        let mut h = harness(two_phase_document(), config);
        let controls = h.orchestrator.controls();
        let (outcome, ()) = tokio::join!(h.orchestrator.start(), async {
            sleep(Duration::from_millis(10)).await;
            controls.skip();
        });
        assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
        h.stage
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_reveal_skip_is_used_up_by_running_reveal() {
        // Act
        let stage = skip_during_predialogue(SkipPolicy::PerReveal).await;

        // Assert
        let predialogue: Vec<Duration> = stage.reveals(Region::Predialogue).iter().map(|r| r.2).collect();
        let text: Vec<Duration> = stage.reveals(Region::Text).iter().map(|r| r.2).collect();
        assert_eq!(predialogue[1..], [Duration::ZERO, Duration::ZERO]);
        assert!(text.iter().all(|fade| *fade == Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sticky_skip_covers_every_remaining_reveal() {
        let stage = skip_during_predialogue(SkipPolicy::Sticky).await;

        let text: Vec<Duration> = stage.reveals(Region::Text).iter().map(|r| r.2).collect();
        assert_eq!(text, vec![Duration::ZERO; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_reveal_skip_between_reveals_is_dropped() {
        // Arrange
        let mut h = harness(two_phase_document(), PlaybackConfig::default());
        let controls = h.orchestrator.controls();

        // Act: the predialogue is fully shown at 1000ms and settles until
        // 2500ms; the skip lands while it settles.
        let (outcome, accepted) = tokio::join!(h.orchestrator.start(), async {
            sleep(Duration::from_millis(2000)).await;
            controls.skip()
        });

        // Assert
        assert_eq!(outcome.unwrap(), PlaybackOutcome::Ended);
        assert!(accepted);
        let text: Vec<Duration> = h.stage.reveals(Region::Text).iter().map(|r| r.2).collect();
        assert_eq!(text, vec![Duration::from_secs(1); 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_variants_follow_flags_set_on_the_way() {
        // Arrange
        let mut h = harness(fixtures::variants(), PlaybackConfig::default());

        // Act
        let outcome = h.orchestrator.start().await.unwrap();

        // Assert
        assert_eq!(outcome, PlaybackOutcome::Ended);
        let lines: Vec<Vec<String>> = h.history.entries().into_iter().map(|entry| entry.lines).collect();
        assert_eq!(
            lines,
            vec![vec!["Fallback text.".to_owned()], vec!["Bare base.".to_owned()]]
        );
        assert!(h.orchestrator.playthrough().flags().is_set("counted"));
        assert_eq!(h.orchestrator.playthrough().path().encode(), "X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_set_gates_own_choices_and_late_set_waits_for_next_node() {
        // Arrange
        let mut h = harness(fixtures::gated(), PlaybackConfig::default());

        // Act
        let first = h.orchestrator.start().await.unwrap();
        let late_door = h.orchestrator.choose(1).await;
        let last = h.orchestrator.choose(0).await.unwrap();

        // Assert
        match first {
            PlaybackOutcome::AwaitingChoice(views) => {
                let texts: Vec<&str> = views.iter().map(|view| view.text.as_str()).collect();
                assert_eq!(texts, vec!["Early door"]);
            }
            other => panic!("expected choices, got {other:?}"),
        }
        assert!(matches!(
            late_door,
            Err(EngineError::ChoiceOutOfRange { index: 1, available: 1 })
        ));
        assert_eq!(last, PlaybackOutcome::Ended);
        assert_eq!(
            h.stage.prepared_lines(Region::Text),
            Some(vec!["Late flag seen.".to_owned()])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_playback_stops_without_history_or_pending_input() {
        // Arrange
        let mut h = harness(fixtures::five_paragraphs(), reveal_timing(150, 300));
        let controls = h.orchestrator.controls();

        // Act
        let (outcome, ()) = tokio::join!(h.orchestrator.start(), async {
            sleep(Duration::from_millis(200)).await;
            controls.supersede();
        });

        // Assert
        assert_eq!(outcome.unwrap(), PlaybackOutcome::Superseded);
        assert!(h.history.entries().is_empty());
        assert!(h.stage.reveals(Region::Text).len() < 5);
        assert!(!h.orchestrator.is_awaiting_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_animations_never_wait() {
        // Arrange
        let config = PlaybackConfig {
            animations_enabled: false,
            ..PlaybackConfig::default()
        };
        let mut h = harness(fixtures::branching(), config);
        let started = Instant::now();

        // Act
        h.orchestrator.start().await.unwrap();
        let outcome = h.orchestrator.choose(1).await.unwrap();

        // Assert
        assert_eq!(outcome, PlaybackOutcome::Ended);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(h.stage.calls().iter().all(|call| match call {
            StageCall::Reveal { fade, .. } | StageCall::Speaker { fade, .. } => fade.is_zero(),
            StageCall::FadeOut(duration) | StageCall::Continue(duration) => duration.is_zero(),
            _ => true,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_scales_reveal_time() {
        let config = PlaybackConfig {
            speed: 0.5,
            ..reveal_timing(150, 300)
        };
        let mut h = harness(fixtures::five_paragraphs(), config);
        let started = Instant::now();

        h.orchestrator.start().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(525));
    }

    #[tokio::test(start_paused = true)]
    async fn test_effects_fire_at_their_timings() {
        // Arrange
        let mut h = harness(fixtures::showcase(), PlaybackConfig::default());

        // Act
        h.orchestrator.start().await.unwrap();
        let intro_calls = h.surface.calls();
        h.orchestrator.advance().await.unwrap();

        // Assert
        assert_eq!(
            intro_calls,
            vec![
                SurfaceCall::Background { key: "harbor".to_owned(), instant: false },
                SurfaceCall::Track { key: "tide".to_owned(), instant: false },
                SurfaceCall::Portrait { side: tapestry_core::presentation::PortraitSide::Left, key: Some("ven".to_owned()) },
                SurfaceCall::OneShot { key: "bell".to_owned(), volume: 1.0 },
            ]
        );
        let meet_calls = h.surface.calls()[intro_calls.len()..].to_vec();
        assert_eq!(
            meet_calls,
            vec![
                SurfaceCall::Portrait { side: tapestry_core::presentation::PortraitSide::Left, key: None },
                SurfaceCall::Portrait { side: tapestry_core::presentation::PortraitSide::Right, key: Some("mara".to_owned()) },
                SurfaceCall::Vignette(1.0),
            ]
        );
        assert!(h.stage.calls().contains(&StageCall::Continue(Duration::from_millis(260))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_previous_node_fades_out_only_after_first_node() {
        let mut h = harness(fixtures::showcase(), PlaybackConfig::default());

        h.orchestrator.start().await.unwrap();
        h.orchestrator.advance().await.unwrap();

        let fade_outs: Vec<StageCall> = h
            .stage
            .calls()
            .into_iter()
            .filter(|call| matches!(call, StageCall::FadeOut(_)))
            .collect();
        assert_eq!(fade_outs, vec![StageCall::FadeOut(Duration::from_secs(2))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predialogue_and_content_blocks_are_recorded_in_order() {
        let mut h = harness(fixtures::showcase(), PlaybackConfig::default());

        h.orchestrator.start().await.unwrap();

        let entries = h.history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].lines, vec!["Years later...".to_owned()]);
        assert_eq!(entries[1].lines.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replayed_final_node_is_not_recorded_twice() {
        // Arrange
        let mut h = harness(fixtures::branching(), PlaybackConfig::default());

        // Act
        let replay = h.orchestrator.replay(&Path::decode("1"));
        let outcome = h.orchestrator.present(&replay.final_node_id, false).await.unwrap();

        // Assert
        assert_eq!(replay.final_node_id, "B");
        assert_eq!(outcome, PlaybackOutcome::Ended);
        assert_eq!(history_nodes(&h.history), vec!["start", "B", "A"]);
        assert_eq!(h.orchestrator.playthrough().path().encode(), "1X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_start_with_clean_history() {
        // Arrange
        let mut h = harness(fixtures::branching(), PlaybackConfig::default());
        h.orchestrator.start().await.unwrap();
        h.orchestrator.choose(0).await.unwrap();

        // Act
        let outcome = h.orchestrator.reset().await.unwrap();

        // Assert
        assert!(matches!(outcome, PlaybackOutcome::AwaitingChoice(_)));
        assert_eq!(h.history.clear_count(), 1);
        assert_eq!(history_nodes(&h.history), vec!["start"]);
        assert!(h.orchestrator.playthrough().path().is_empty());
        assert!(!h.orchestrator.playthrough().flags().is_set("tookB"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_target_is_an_error() {
        let document: Arc<ContentDocument> = Arc::new(
            serde_json::from_value(json!({
                "meta": { "title": "t" },
                "start": "s",
                "nodes": { "s": { "type": "narration", "autoNext": "gone" } }
            }))
            .unwrap(),
        );
        let mut h = harness(document, PlaybackConfig::default());

        let result = h.orchestrator.start().await;

        assert!(matches!(result, Err(EngineError::NodeNotFound(id)) if id == "gone"));
    }
}
