//! Effect dispatch onto the presentation surface.

use std::fmt;

use tapestry_content::{AssetKind, Assets, Effect, Node};
use tapestry_core::flags::Flags;
use tapestry_core::predicate::matches;
use tapestry_core::presentation::{Asset, PortraitSide, PresentationSurface};
use tracing::warn;

use crate::domain::defects::PresentationDefect;

/// Dispatches resolved effects to a [`PresentationSurface`].
///
/// Every key is checked against the document's asset tables first; a
/// missing key is reported as a [`PresentationDefect`] and the change is
/// skipped. Portraits are tracked per side so re-requesting the one already
/// shown is a no-op.
pub struct Effects {
    surface: Box<dyn PresentationSurface>,
    left: Option<String>,
    right: Option<String>,
    defects: Vec<PresentationDefect>,
}

impl Effects {
    /// Wraps `surface`.
    #[must_use]
    pub fn new(surface: Box<dyn PresentationSurface>) -> Self {
        Self {
            surface,
            left: None,
            right: None,
            defects: Vec::new(),
        }
    }

    /// Portrait currently shown in `side`.
    #[must_use]
    pub fn portrait(&self, side: PortraitSide) -> Option<&str> {
        match side {
            PortraitSide::Left => self.left.as_deref(),
            PortraitSide::Right => self.right.as_deref(),
        }
    }

    /// Defects reported since the last call, oldest first.
    pub fn take_defects(&mut self) -> Vec<PresentationDefect> {
        std::mem::take(&mut self.defects)
    }

    /// Applies `effects` in order.
    ///
    /// In `instant` mode transitions are cut and one-shot sound effects are
    /// not played at all.
    pub fn apply(&mut self, assets: &Assets, effects: &[&Effect], instant: bool) {
        for effect in effects {
            if let Some(key) = &effect.background {
                if let Some(asset) = self.asset(assets, AssetKind::Background, key) {
                    self.surface.show_background(asset, instant);
                }
            }
            if let Some(key) = &effect.soundtrack {
                if let Some(asset) = self.asset(assets, AssetKind::Soundtrack, key) {
                    self.surface.crossfade_track(asset, instant);
                }
            }
            if !instant {
                for sound in &effect.sound_effect {
                    if let Some(asset) = self.asset(assets, AssetKind::SoundEffect, &sound.key) {
                        let volume = sound.volume.unwrap_or(1.0).clamp(0.0, 1.0);
                        self.surface.play_one_shot(asset, volume);
                    }
                }
            }
            if effect.stop_soundtrack {
                self.surface.stop_track(instant);
            }
            if let Some(key) = &effect.portrait_left {
                self.show_portrait(assets, PortraitSide::Left, key);
            }
            if let Some(key) = &effect.portrait_right {
                self.show_portrait(assets, PortraitSide::Right, key);
            }
            if let Some(factor) = effect.vignette_dark_factor {
                self.surface.set_vignette(factor.clamp(0.0, 1.0));
            }
        }
    }

    /// Hides portraits that `node` does not request again.
    ///
    /// A side stays up only if one of the node's effects, whose predicate
    /// matches `flags`, asks for the portrait already shown there.
    pub fn clear_stale_portraits(&mut self, node: &Node, flags: &Flags) {
        let mut keep_left = false;
        let mut keep_right = false;
        for effect in node
            .effects
            .iter()
            .filter(|effect| matches(effect.condition.as_ref(), flags))
        {
            keep_left |= effect.portrait_left.is_some() && effect.portrait_left == self.left;
            keep_right |= effect.portrait_right.is_some() && effect.portrait_right == self.right;
        }
        if !keep_left {
            self.hide_portrait(PortraitSide::Left);
        }
        if !keep_right {
            self.hide_portrait(PortraitSide::Right);
        }
    }

    /// Stops the track and hides both portraits.
    pub fn reset(&mut self) {
        self.surface.stop_track(true);
        self.hide_portrait(PortraitSide::Left);
        self.hide_portrait(PortraitSide::Right);
    }

    fn show_portrait(&mut self, assets: &Assets, side: PortraitSide, key: &str) {
        if self.portrait(side) == Some(key) {
            return;
        }
        let Some(asset) = self.asset(assets, AssetKind::Portrait, key) else {
            return;
        };
        self.surface.set_portrait(side, Some(asset));
        *self.slot(side) = Some(key.to_owned());
    }

    fn hide_portrait(&mut self, side: PortraitSide) {
        if self.slot(side).take().is_some() {
            self.surface.set_portrait(side, None);
        }
    }

    fn slot(&mut self, side: PortraitSide) -> &mut Option<String> {
        match side {
            PortraitSide::Left => &mut self.left,
            PortraitSide::Right => &mut self.right,
        }
    }

    fn asset<'a>(&mut self, assets: &'a Assets, kind: AssetKind, key: &'a str) -> Option<Asset<'a>> {
        if let Some(resource) = assets.lookup(kind, key) {
            return Some(Asset { key, resource });
        }
        let defect = PresentationDefect::MissingAsset {
            kind,
            key: key.to_owned(),
        };
        warn!(%defect, "skipping presentation change");
        self.defects.push(defect);
        None
    }
}

impl fmt::Debug for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects")
            .field("left", &self.left)
            .field("right", &self.right)
            .field("defects", &self.defects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tapestry_content::{ContentDocument, Timing};
    use tapestry_test_support::{RecordingSurface, SurfaceCall, fixtures};

    use super::*;
    use crate::domain::resolve::resolve_effects;

    fn dispatch(document: &ContentDocument, node_id: &str, timing: Timing, instant: bool) -> (Effects, RecordingSurface) {
        let surface = RecordingSurface::new();
        let mut effects = Effects::new(Box::new(surface.clone()));
        let node = document.node(node_id).unwrap();
        let resolved = resolve_effects(node, timing, &Flags::new());
        effects.apply(&document.assets, &resolved, instant);
        (effects, surface)
    }

    #[test]
    fn test_node_start_effects_reach_surface_in_order() {
        // Arrange
        let document = fixtures::showcase();

        // Act
        let (effects, surface) = dispatch(&document, "intro", Timing::NodeStart, false);

        // Assert
        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::Background { key: "harbor".to_owned(), instant: false },
                SurfaceCall::Track { key: "tide".to_owned(), instant: false },
                SurfaceCall::Portrait { side: PortraitSide::Left, key: Some("ven".to_owned()) },
            ]
        );
        assert_eq!(effects.portrait(PortraitSide::Left), Some("ven"));
    }

    #[test]
    fn test_sound_effect_volume_is_clamped() {
        let document = fixtures::showcase();

        let (_, surface) = dispatch(&document, "intro", Timing::TextEnd, false);

        assert_eq!(surface.calls(), vec![SurfaceCall::OneShot { key: "bell".to_owned(), volume: 1.0 }]);
    }

    #[test]
    fn test_instant_mode_skips_one_shots() {
        let document = fixtures::showcase();

        let (_, surface) = dispatch(&document, "intro", Timing::TextEnd, true);

        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_vignette_is_clamped() {
        let document = fixtures::showcase();

        let (_, surface) = dispatch(&document, "meet", Timing::ChoicesStart, false);

        assert_eq!(surface.calls(), vec![SurfaceCall::Vignette(1.0)]);
    }

    #[test]
    fn test_missing_asset_is_reported_and_skipped() {
        // Arrange
        let document = fixtures::showcase();

        // Act
        let (mut effects, surface) = dispatch(&document, "leave", Timing::NodeStart, false);

        // Assert
        assert!(surface.calls().is_empty());
        assert_eq!(
            effects.take_defects(),
            vec![PresentationDefect::MissingAsset {
                kind: AssetKind::Background,
                key: "nowhere".to_owned(),
            }]
        );
        assert!(effects.take_defects().is_empty());
    }

    #[test]
    fn test_same_portrait_is_not_reapplied() {
        // Arrange
        let document = fixtures::showcase();
        let surface = RecordingSurface::new();
        let mut effects = Effects::new(Box::new(surface.clone()));
        let node = document.node("intro").unwrap();
        let resolved = resolve_effects(node, Timing::NodeStart, &Flags::new());

        // Act
        effects.apply(&document.assets, &resolved, false);
        effects.clear_stale_portraits(node, &Flags::new());
        effects.apply(&document.assets, &resolved, false);

        // Assert
        let portrait_calls = surface
            .calls()
            .into_iter()
            .filter(|call| matches!(call, SurfaceCall::Portrait { .. }))
            .count();
        assert_eq!(portrait_calls, 1);
    }

    #[test]
    fn test_portraits_not_requested_again_are_cleared() {
        // Arrange
        let document = fixtures::showcase();
        let surface = RecordingSurface::new();
        let mut effects = Effects::new(Box::new(surface.clone()));
        let intro = document.node("intro").unwrap();
        let meet = document.node("meet").unwrap();
        effects.apply(&document.assets, &resolve_effects(intro, Timing::NodeStart, &Flags::new()), false);

        // Act
        effects.clear_stale_portraits(meet, &Flags::new());

        // Assert
        assert_eq!(effects.portrait(PortraitSide::Left), None);
        assert_eq!(
            surface.calls().last(),
            Some(&SurfaceCall::Portrait { side: PortraitSide::Left, key: None })
        );
    }

    #[test]
    fn test_stop_soundtrack_follows_new_track_within_one_effect() {
        let document: ContentDocument = serde_json::from_value(json!({
            "meta": { "title": "t" },
            "assets": { "soundtracks": { "a": "a.ogg" } },
            "start": "s",
            "nodes": { "s": { "type": "narration", "end": true,
                "effects": [ { "soundtrack": "a", "stopSoundtrack": true } ] } }
        }))
        .unwrap();

        let (_, surface) = dispatch(&document, "s", Timing::NodeStart, true);

        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::Track { key: "a".to_owned(), instant: true },
                SurfaceCall::StopTrack { instant: true },
            ]
        );
    }
}
