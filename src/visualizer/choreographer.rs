//! Animated camera transitions between follow, overhead and view-shift
//! positions.

use bevy::math::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::geometry::random_unit_offset;
use super::scene::PerspectiveCamera;
use super::tween::{Easing, Tween};
use crate::config::VisualizerConfig;
use crate::models::{BodyId, PlayerKinematicState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraView {
    Follow,
    Overhead,
    Shift,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub view: CameraView,
    pub tween: Tween<DVec3>,
}

/// Owns the single active camera animation.
///
/// Starting a transition replaces whatever was running; the new one starts
/// from the camera's current position.
#[derive(Debug)]
pub struct CameraChoreographer {
    active: Option<CameraTransition>,
    current_body: Option<BodyId>,
    rng: StdRng,
}

impl Default for CameraChoreographer {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl CameraChoreographer {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            active: None,
            current_body: None,
            rng,
        }
    }

    pub fn active(&self) -> Option<&CameraTransition> {
        self.active.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Random follow offset around the player, sized to the situation.
    pub fn follow_offset(&mut self, state: &PlayerKinematicState, config: &VisualizerConfig) -> DVec3 {
        let distance = if state.is_traveling() {
            config.traveling_follow_distance
        } else {
            let radius_km = state
                .body
                .radius
                .filter(|r| *r > 0.0)
                .unwrap_or(config.fallback_body_radius_km);
            radius_km / config.landed_follow_divisor
        };
        random_unit_offset(&mut self.rng) * distance
    }

    /// Put the camera at a follow position immediately.
    pub fn place_initial(
        &mut self,
        state: &PlayerKinematicState,
        camera: &mut PerspectiveCamera,
        config: &VisualizerConfig,
    ) {
        let player = state.scaled_position(config.distance_factor);
        camera.position = player + self.follow_offset(state, config);
        camera.look_at = player;
        self.current_body = Some(state.body.id);
    }

    pub fn enter_follow_view(
        &mut self,
        state: &PlayerKinematicState,
        camera: &PerspectiveCamera,
        now_ms: f64,
        config: &VisualizerConfig,
    ) {
        let target = state.scaled_position(config.distance_factor) + self.follow_offset(state, config);
        self.start(
            CameraView::Follow,
            Tween::new(
                camera.position,
                target,
                now_ms,
                config.follow_duration_ms,
                Easing::QuarticOut,
            ),
        );
    }

    pub fn enter_overhead_view(
        &mut self,
        state: &PlayerKinematicState,
        camera: &PerspectiveCamera,
        now_ms: f64,
        config: &VisualizerConfig,
    ) {
        let target = overhead_position(state, config);
        self.start(
            CameraView::Overhead,
            Tween::new(
                camera.position,
                target,
                now_ms,
                config.overhead_duration_ms,
                Easing::QuarticInOut,
            ),
        );
    }

    /// Move to whichever of a fresh follow position and the overhead
    /// position is farther from the camera.
    pub fn trigger_view_shift(
        &mut self,
        state: &PlayerKinematicState,
        camera: &PerspectiveCamera,
        now_ms: f64,
        config: &VisualizerConfig,
    ) {
        let follow = state.scaled_position(config.distance_factor) + self.follow_offset(state, config);
        let overhead = overhead_position(state, config);
        let target = if camera.position.distance(follow) >= camera.position.distance(overhead) {
            follow
        } else {
            overhead
        };
        self.start(
            CameraView::Shift,
            Tween::new(
                camera.position,
                target,
                now_ms,
                config.view_shift_duration_ms,
                Easing::QuarticOut,
            ),
        );
    }

    /// React to a new snapshot: re-center when the player's body changed.
    ///
    /// Nothing happens for the first body seen. Returns `true` when a
    /// follow transition started.
    pub fn observe(
        &mut self,
        state: &PlayerKinematicState,
        camera: &PerspectiveCamera,
        now_ms: f64,
        config: &VisualizerConfig,
    ) -> bool {
        let previous = self.current_body.replace(state.body.id);
        match previous {
            Some(previous) if previous != state.body.id => {
                tracing::debug!(from = %previous, to = %state.body.id, "Body changed, re-centering camera");
                self.enter_follow_view(state, camera, now_ms, config);
                true
            }
            _ => false,
        }
    }

    fn start(&mut self, view: CameraView, tween: Tween<DVec3>) {
        if let Some(previous) = self.active.replace(CameraTransition { view, tween }) {
            tracing::debug!(replaced = ?previous.view, with = ?view, "Camera transition superseded");
        }
    }

    /// Advance the active transition. Returns `true` while animating.
    pub fn update(&mut self, now_ms: f64, camera: &mut PerspectiveCamera) -> bool {
        let Some(transition) = &self.active else {
            return false;
        };
        camera.position = transition.tween.value_at(now_ms);
        if transition.tween.is_finished(now_ms) {
            self.active = None;
            return false;
        }
        true
    }

    /// Shift the active transition along with a moving target.
    pub fn translate(&mut self, delta: DVec3) {
        if let Some(transition) = &mut self.active {
            transition.tween.translate(delta);
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.current_body = None;
    }
}

fn overhead_position(state: &PlayerKinematicState, config: &VisualizerConfig) -> DVec3 {
    let player = state.scaled_position(config.distance_factor);
    DVec3::new(player.x, player.y, config.overhead_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyKind, CelestialBody, UserStatus};

    fn config() -> VisualizerConfig {
        VisualizerConfig {
            distance_factor: 1.0,
            ..Default::default()
        }
    }

    fn state(status: UserStatus, body: i64, radius: Option<f64>) -> PlayerKinematicState {
        PlayerKinematicState {
            username: "ada".to_string(),
            status,
            position: DVec3::new(100.0, 50.0, 0.0),
            velocity: DVec3::ZERO,
            body: CelestialBody {
                id: BodyId(body),
                name: "Earth".to_string(),
                kind: BodyKind::Planet,
                position: DVec3::ZERO,
                radius,
                orbiting: None,
            },
            color: "#ffffff".to_string(),
            server_time: chrono::Utc::now(),
            landing_time: None,
            next_boost: None,
            speed: 0.0,
            groups: Vec::new(),
            items: Vec::new(),
            notification: None,
        }
    }

    fn choreographer() -> CameraChoreographer {
        CameraChoreographer::with_rng(StdRng::seed_from_u64(42))
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&config(), 1.0)
    }

    #[test]
    fn test_follow_offset_distances() {
        let config = config();
        let mut choreo = choreographer();

        let traveling = choreo.follow_offset(&state(UserStatus::Traveling, 1, Some(6371.0)), &config);
        assert!((traveling.length() - 0.01).abs() < 1e-12);

        let landed = choreo.follow_offset(&state(UserStatus::Landed, 1, Some(6371.0)), &config);
        assert!((landed.length() - 6371.0 / 500_000.0).abs() < 1e-12);

        let unknown = choreo.follow_offset(&state(UserStatus::Landed, 1, None), &config);
        assert!((unknown.length() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_follow_transition_reaches_target() {
        let config = config();
        let mut choreo = choreographer();
        let mut camera = camera();
        let player = state(UserStatus::Traveling, 1, None);

        choreo.enter_follow_view(&player, &camera, 0.0, &config);
        let target = choreo.active().unwrap().tween.to();

        assert!(choreo.update(2500.0, &mut camera));
        assert!(!choreo.update(5000.0, &mut camera));
        assert_eq!(camera.position, target);
        assert!((camera.position - player.position).length() < 0.010001);
        assert!(!choreo.is_animating());
    }

    #[test]
    fn test_new_transition_replaces_old_from_current_position() {
        let config = config();
        let mut choreo = choreographer();
        let mut camera = camera();
        let player = state(UserStatus::Traveling, 1, None);

        choreo.enter_follow_view(&player, &camera, 0.0, &config);
        choreo.update(1000.0, &mut camera);
        let midway = camera.position;

        choreo.enter_overhead_view(&player, &camera, 1000.0, &config);
        let active = choreo.active().unwrap();
        assert_eq!(active.view, CameraView::Overhead);
        assert_eq!(active.tween.from(), midway);
        assert_eq!(active.tween.to(), DVec3::new(100.0, 50.0, 1000.0));
        assert_eq!(active.tween.easing(), Easing::QuarticInOut);
    }

    #[test]
    fn test_view_shift_picks_farther_target() {
        let config = config();
        let mut choreo = choreographer();
        let mut camera = camera();
        let player = state(UserStatus::Traveling, 1, None);

        // Next to the player: overhead is farther
        camera.position = DVec3::new(100.0, 50.0, 0.0);
        choreo.trigger_view_shift(&player, &camera, 0.0, &config);
        assert_eq!(choreo.active().unwrap().tween.to(), DVec3::new(100.0, 50.0, 1000.0));

        // Above the player: the follow position is farther
        camera.position = DVec3::new(100.0, 50.0, 1000.0);
        choreo.trigger_view_shift(&player, &camera, 0.0, &config);
        let to = choreo.active().unwrap().tween.to();
        assert!((to - player.position).length() < 0.010001);
    }

    #[test]
    fn test_observe_only_reacts_to_body_changes() {
        let config = config();
        let mut choreo = choreographer();
        let camera = camera();

        assert!(!choreo.observe(&state(UserStatus::Traveling, 1, None), &camera, 0.0, &config));
        assert!(!choreo.observe(&state(UserStatus::Traveling, 1, None), &camera, 0.0, &config));
        assert!(choreo.observe(&state(UserStatus::Traveling, 2, None), &camera, 0.0, &config));
        assert_eq!(choreo.active().unwrap().view, CameraView::Follow);
    }

    #[test]
    fn test_translate_rides_along() {
        let config = config();
        let mut choreo = choreographer();
        let mut camera = camera();
        let player = state(UserStatus::Traveling, 1, None);

        choreo.enter_overhead_view(&player, &camera, 0.0, &config);
        choreo.translate(DVec3::X);
        choreo.update(5000.0, &mut camera);

        assert_eq!(camera.position, DVec3::new(101.0, 50.0, 1000.0));
    }
}
