//! Playback timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::skip::SkipPolicy;
use crate::domain::continuation::ContinuationPolicy;

/// Animation and interaction settings. Durations are in milliseconds and
/// are multiplied by `speed` before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    /// Global duration multiplier. `0` plays without waiting.
    pub speed: f64,
    /// When `false`, every element appears at once and nothing waits.
    pub animations_enabled: bool,
    /// Whether the player may skip a running reveal.
    pub allow_skip: bool,
    /// How long a skip stays armed.
    pub skip_policy: SkipPolicy,
    /// Whether linear nodes wait for an explicit continue.
    pub continuation_policy: ContinuationPolicy,
    /// Fade-out of the previous node's regions.
    pub node_fade_out: u64,
    /// Fade-in of the speaker label.
    pub node_fade_in: u64,
    /// Delay between predialogue lines.
    pub predialogue_stagger: u64,
    /// Fade-in of one text or predialogue line.
    pub paragraph_fade: u64,
    /// Delay between body lines.
    pub paragraph_stagger: u64,
    /// Fade-in of one choice.
    pub choice_fade: u64,
    /// Delay between choices.
    pub choice_stagger: u64,
    /// Fade-in of the continue control.
    pub continue_fade: u64,
    /// Pause once the predialogue is shown.
    pub pause_after_predialogue: u64,
    /// Pause once the body text is shown.
    pub pause_after_text: u64,
    /// Pause before following `autoNext`.
    pub pause_before_auto_next: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            animations_enabled: true,
            allow_skip: true,
            skip_policy: SkipPolicy::default(),
            continuation_policy: ContinuationPolicy::default(),
            node_fade_out: 2000,
            node_fade_in: 1000,
            predialogue_stagger: 500,
            paragraph_fade: 1000,
            paragraph_stagger: 2500,
            choice_fade: 330,
            choice_stagger: 150,
            continue_fade: 260,
            pause_after_predialogue: 1500,
            pause_after_text: 50,
            pause_before_auto_next: 1000,
        }
    }
}

impl PlaybackConfig {
    /// Converts a configured duration to wall time.
    ///
    /// Returns zero when animations are disabled or `speed` is not a
    /// positive finite number.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn scaled(&self, millis: u64) -> Duration {
        if !self.animations_enabled || !self.speed.is_finite() || self.speed <= 0.0 {
            return Duration::ZERO;
        }
        // Rounded to whole microseconds so that exact multiples stay exact.
        let micros = (millis as f64 * self.speed * 1000.0).round();
        Duration::from_micros(micros as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_timings() {
        let config = PlaybackConfig::default();

        assert_eq!(config.scaled(config.node_fade_out), Duration::from_secs(2));
        assert_eq!(config.scaled(config.paragraph_stagger), Duration::from_millis(2500));
        assert!(config.allow_skip);
    }

    #[test]
    fn test_speed_scales_durations() {
        let config = PlaybackConfig {
            speed: 0.5,
            ..PlaybackConfig::default()
        };

        assert_eq!(config.scaled(300), Duration::from_millis(150));
    }

    #[test]
    fn test_disabled_animations_and_bad_speed_yield_zero() {
        let disabled = PlaybackConfig {
            animations_enabled: false,
            ..PlaybackConfig::default()
        };
        let negative = PlaybackConfig {
            speed: -1.0,
            ..PlaybackConfig::default()
        };
        let nan = PlaybackConfig {
            speed: f64::NAN,
            ..PlaybackConfig::default()
        };

        assert_eq!(disabled.scaled(1000), Duration::ZERO);
        assert_eq!(negative.scaled(1000), Duration::ZERO);
        assert_eq!(nan.scaled(1000), Duration::ZERO);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        // Arrange
        let json = r#"{ "speed": 2, "skipPolicy": "sticky", "continuationPolicy": "always", "choiceFade": 10 }"#;

        // Act
        let config: PlaybackConfig = serde_json::from_str(json).unwrap();

        // Assert
        assert!((config.speed - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.skip_policy, SkipPolicy::Sticky);
        assert_eq!(config.continuation_policy, ContinuationPolicy::Always);
        assert_eq!(config.choice_fade, 10);
        assert_eq!(config.node_fade_out, 2000);
    }
}
