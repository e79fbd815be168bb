//! The player's ship: snapping to authoritative snapshots and dead
//! reckoning between them.

use bevy::color::Srgba;
use bevy::math::DVec3;

use super::assets::{parse_color, LoadId, LoadTarget, ShipModel};
use super::choreographer::CameraChoreographer;
use super::geometry::look_rotation;
use super::scene::{Material, NodeId, RenderContext, SceneNode, Shape};
use crate::config::VisualizerConfig;
use crate::models::PlayerKinematicState;

const MS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

#[derive(Debug, Default)]
pub struct KinematicExtrapolator {
    ship: Option<NodeId>,
    model_load: Option<LoadId>,
    snapshot: Option<PlayerKinematicState>,
}

impl KinematicExtrapolator {
    pub fn ship(&self) -> Option<NodeId> {
        self.ship
    }

    /// Queue the ship model load. Only the first call does anything.
    pub fn request_model(&mut self, ctx: &mut RenderContext, config: &VisualizerConfig) {
        if self.ship.is_some() || self.model_load.is_some() {
            return;
        }
        self.model_load = Some(ctx.assets.request(LoadTarget::ShipModel, config.ship_model.clone()));
    }

    /// Add the loaded ship to the scene and apply the latest snapshot to it.
    pub fn on_model_loaded(&mut self, model: ShipModel, ctx: &mut RenderContext, config: &VisualizerConfig) {
        self.model_load = None;
        if self.ship.is_some() {
            return;
        }
        let node = SceneNode::new(Shape::Model { parts: model.parts }, Material::default())
            .scaled(config.ship_scale);
        self.ship = Some(ctx.scene.add(node));
        tracing::debug!("Ship model added to scene");

        if let Some(snapshot) = self.snapshot.clone() {
            self.place_ship(&snapshot, ctx, config);
        }
    }

    pub fn on_model_failed(&mut self, reason: &str) {
        self.model_load = None;
        tracing::warn!(%reason, "Ship model failed to load, continuing without it");
    }

    /// Take a new authoritative snapshot, discarding accumulated drift.
    pub fn apply_snapshot(
        &mut self,
        state: &PlayerKinematicState,
        ctx: &mut RenderContext,
        config: &VisualizerConfig,
    ) {
        self.snapshot = Some(state.clone());
        self.place_ship(state, ctx, config);
        ctx.controls.target = state.scaled_position(config.distance_factor);
    }

    fn place_ship(&self, state: &PlayerKinematicState, ctx: &mut RenderContext, config: &VisualizerConfig) {
        let Some(node) = self.ship.and_then(|id| ctx.scene.node_mut(id)) else {
            return;
        };
        let position = state.scaled_position(config.distance_factor);
        node.position = position;
        node.rotation = look_rotation(position, state.body.scaled_position(config.distance_factor));

        let color = parse_color(&state.color).unwrap_or_else(|err| {
            tracing::warn!(color = %state.color, error = %err, "Unusable user color, using white");
            Srgba::WHITE
        });
        let opacity = if state.is_traveling() { 1.0 } else { 0.0 };
        for material in node.mesh_materials_mut() {
            material.color = color;
            material.opacity = opacity;
        }
    }

    /// Dead-reckon the ship forward by `delta_ms` and carry the camera,
    /// the orbit target and any active camera transition along with it.
    ///
    /// Returns the displacement in render units.
    pub fn advance(
        &mut self,
        delta_ms: f64,
        ctx: &mut RenderContext,
        choreographer: &mut CameraChoreographer,
        config: &VisualizerConfig,
    ) -> DVec3 {
        let (Some(ship), Some(snapshot)) = (self.ship, &self.snapshot) else {
            return DVec3::ZERO;
        };
        let Some(node) = ctx.scene.node_mut(ship) else {
            return DVec3::ZERO;
        };

        let delta = snapshot.velocity * (delta_ms / MS_PER_HOUR) / config.distance_factor;
        node.position += delta;
        ctx.controls.target = node.position;
        ctx.camera.position += delta;
        choreographer.translate(delta);
        delta
    }

    /// Where the ship is drawn right now.
    pub fn rendered_position(&self, ctx: &RenderContext) -> Option<DVec3> {
        ctx.scene.get(self.ship?).map(|node| node.position)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
