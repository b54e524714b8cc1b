use engine::{LoopMode, SceneWorld, Tween, Vec3};
use tracing::debug;

use crate::app::config::RoomTransitionConfig;

const PULSE_REPETITIONS: u32 = 2;

/// Camera anchor move plus the vignette pulse that accompanies a room change.
///
/// At most one transition is in flight. Starting a new one overwrites both
/// tweens, so a superseded move simply stops where it was and the new tween
/// continues from the anchor's current position.
#[derive(Debug, Clone)]
pub(crate) struct CameraTransition {
    duration_seconds: f32,
    vignette_rest: f32,
    vignette_max: f32,
    camera: Option<Tween<Vec3>>,
    pulse: Option<Tween<f32>>,
}

impl CameraTransition {
    pub(crate) fn new(config: RoomTransitionConfig) -> Self {
        Self {
            duration_seconds: config.duration_seconds,
            vignette_rest: config.vignette_rest,
            vignette_max: config.vignette_max,
            camera: None,
            pulse: None,
        }
    }

    pub(crate) fn start(&mut self, from: Vec3, to: Vec3) {
        if self.is_active() {
            debug!("camera_transition_superseded");
        }
        self.camera = Some(Tween::new(from, to, self.duration_seconds));
        // Out and back over the camera duration; always restarts from rest.
        self.pulse = Some(
            Tween::new(
                self.vignette_rest,
                self.vignette_max,
                self.duration_seconds * 0.5,
            )
            .with_loops(PULSE_REPETITIONS, LoopMode::Yoyo),
        );
    }

    /// Places the camera on `anchor` immediately and drops any running tween.
    pub(crate) fn snap(&mut self, world: &mut SceneWorld, anchor: Vec3) {
        self.camera = None;
        self.pulse = None;
        world.camera_mut().root = anchor;
        world.post_fx_mut().vignette_intensity = self.vignette_rest;
    }

    pub(crate) fn advance(&mut self, dt_seconds: f32, world: &mut SceneWorld) {
        if let Some(tween) = self.camera.as_mut() {
            world.camera_mut().root = tween.advance(dt_seconds);
            if tween.is_finished() {
                self.camera = None;
            }
        }
        if let Some(tween) = self.pulse.as_mut() {
            world.post_fx_mut().vignette_intensity = tween.advance(dt_seconds);
            if tween.is_finished() {
                self.pulse = None;
                world.post_fx_mut().vignette_intensity = self.vignette_rest;
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.camera.is_some() || self.pulse.is_some()
    }

    #[cfg(test)]
    pub(crate) fn pulse_duration(&self) -> Option<f32> {
        self.pulse.as_ref().map(Tween::total_duration)
    }
}
