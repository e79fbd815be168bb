//! Scene representations of the celestial bodies and their distance-based
//! level of detail.
//!
//! Every body starts as a flat placeholder sphere. Once the camera comes
//! close enough, a textured sphere is built next to it and the two are
//! blended by distance. The textured sphere is never torn down again.

use std::collections::{BTreeMap, HashMap};

use bevy::color::Srgba;
use bevy::math::DQuat;

use super::assets::{texture_for_body, LoadId, LoadOutcome, LoadTarget};
use super::geometry::distance_radius_factor;
use super::scene::{Blending, Material, NodeId, RenderContext, SceneNode, Shape};
use crate::config::VisualizerConfig;
use crate::models::{BodyCatalog, BodyId, BodyKind, CelestialBody};

pub const ORBIT_LINE_COLOR: Srgba = Srgba::rgb(0.25, 0.25, 0.25);
pub const ORBIT_SEGMENTS: u32 = 100;
pub const AMBIENT_COLOR: Srgba = Srgba::rgb(16.0 / 255.0, 16.0 / 255.0, 16.0 / 255.0);
const POINT_LIGHT_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighDetail {
    pub node: NodeId,
    pub load: LoadId,
    pub texture: TextureState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyEntry {
    pub body: CelestialBody,
    pub placeholder: NodeId,
    /// Placeholder radius in render units.
    pub radius: f64,
    pub high_detail: Option<HighDetail>,
    pub orbit_line: Option<NodeId>,
    /// Distance factor from the last LOD pass.
    pub distance_factor: f64,
}

impl BodyEntry {
    pub fn is_high_detail_loaded(&self) -> bool {
        self.high_detail.is_some()
    }
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    entries: BTreeMap<BodyId, BodyEntry>,
    by_load: HashMap<LoadId, BodyId>,
    lights: Vec<NodeId>,
}

impl BodyRegistry {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: BodyId) -> Option<&BodyEntry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodyEntry> {
        self.entries.values()
    }

    pub fn lights(&self) -> &[NodeId] {
        &self.lights
    }

    /// Create placeholders, orbit lines and scene lighting.
    ///
    /// Runs once per session; later calls return `0` and change nothing.
    pub fn build(
        &mut self,
        catalog: &BodyCatalog,
        ctx: &mut RenderContext,
        config: &VisualizerConfig,
    ) -> usize {
        if !self.entries.is_empty() || catalog.is_empty() {
            return 0;
        }

        for body in catalog.iter() {
            let position = body.scaled_position(config.distance_factor);
            let radius = body.scaled_radius(config.distance_factor, config.default_body_radius);

            let placeholder = ctx.scene.add(
                SceneNode::new(
                    Shape::Sphere { radius },
                    Material::unlit(Srgba::WHITE).with_opacity(0.0),
                )
                .at(position),
            );

            let orbit_line = catalog.orbit_center(body.id).map(|center| {
                let center = center / config.distance_factor;
                let orbit_radius = position.distance(center);
                ctx.scene.add(
                    SceneNode::new(
                        Shape::Circle {
                            segments: ORBIT_SEGMENTS,
                        },
                        Material {
                            blending: Blending::Additive,
                            ..Material::unlit(ORBIT_LINE_COLOR)
                        },
                    )
                    .at(center)
                    .scaled(orbit_radius),
                )
            });

            self.entries.insert(
                body.id,
                BodyEntry {
                    body: body.clone(),
                    placeholder,
                    radius,
                    high_detail: None,
                    orbit_line,
                    distance_factor: f64::INFINITY,
                },
            );
        }

        self.lights.push(ctx.scene.add(SceneNode::new(
            Shape::PointLight {
                intensity: POINT_LIGHT_INTENSITY,
            },
            Material::default(),
        )));
        self.lights.push(ctx.scene.add(SceneNode::new(
            Shape::AmbientLight,
            Material::unlit(AMBIENT_COLOR),
        )));

        tracing::info!(bodies = self.entries.len(), "Built body registry");
        self.entries.len()
    }

    /// Recompute every body's level of detail from the camera position.
    pub fn update_lod(&mut self, ctx: &mut RenderContext, config: &VisualizerConfig) {
        let camera = ctx.camera.position;
        if !camera.is_finite() {
            return;
        }

        for entry in self.entries.values_mut() {
            let Some((position, current_opacity, current_scale)) = ctx
                .scene
                .get(entry.placeholder)
                .map(|node| (node.position, node.material.opacity, node.scale))
            else {
                continue;
            };
            let distance = camera.distance(position);
            let factor = distance_radius_factor(distance, entry.radius, config.lod_distance_divisor);
            entry.distance_factor = factor;

            if factor < config.lod_threshold && entry.high_detail.is_none() {
                let high_detail = request_high_detail(entry, ctx, config);
                self.by_load.insert(high_detail.load, entry.body.id);
                entry.high_detail = Some(high_detail);
            }

            let falloff = factor.powi(config.lod_falloff_exponent).min(1.0) as f32;
            let textured_ready = entry
                .high_detail
                .as_ref()
                .is_some_and(|hd| hd.texture == TextureState::Ready);
            let show_high_detail = factor < 1.0 && textured_ready;

            // Unchanged nodes keep their revision so mirrors can skip them
            let opacity = if show_high_detail { falloff } else { 1.0 };
            let scale = factor.max(1.0);
            if current_opacity != opacity || current_scale != scale {
                if let Some(node) = ctx.scene.node_mut(entry.placeholder) {
                    node.material.opacity = opacity;
                    node.scale = scale;
                }
            }

            if let Some(hd) = &entry.high_detail {
                if let Some(node) = ctx.scene.node_mut(hd.node) {
                    node.visible = show_high_detail;
                    node.rotation *= DQuat::from_rotation_y(config.body_rotation_step);
                }
            }

            if let Some(line) = entry.orbit_line {
                let stale = ctx
                    .scene
                    .get(line)
                    .is_some_and(|node| node.material.opacity != falloff);
                if stale {
                    if let Some(node) = ctx.scene.node_mut(line) {
                        node.material.opacity = falloff;
                    }
                }
            }
        }
    }

    /// Apply a finished texture load. Returns `false` for loads this
    /// registry did not request.
    pub fn on_texture_loaded(
        &mut self,
        load: LoadId,
        outcome: &LoadOutcome,
        path: &str,
        ctx: &mut RenderContext,
    ) -> bool {
        let Some(body_id) = self.by_load.remove(&load) else {
            return false;
        };
        let Some(hd) = self
            .entries
            .get_mut(&body_id)
            .and_then(|entry| entry.high_detail.as_mut())
        else {
            return false;
        };

        match outcome {
            LoadOutcome::Texture => {
                hd.texture = TextureState::Ready;
                if let Some(node) = ctx.scene.node_mut(hd.node) {
                    node.material.texture = Some(path.to_string());
                }
                tracing::debug!(body = %body_id, %path, "Body texture ready");
            }
            LoadOutcome::Failed(reason) => {
                hd.texture = TextureState::Failed;
                tracing::warn!(body = %body_id, %path, %reason, "Body texture failed, keeping placeholder");
            }
            LoadOutcome::Model(_) => {
                hd.texture = TextureState::Failed;
                tracing::warn!(body = %body_id, %path, "Expected a texture, got a model");
            }
        }
        true
    }

    /// Release every entry. The scene itself is cleared by its owner.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_load.clear();
        self.lights.clear();
    }
}

/// Queue the texture load and add the (hidden) textured sphere.
fn request_high_detail(
    entry: &BodyEntry,
    ctx: &mut RenderContext,
    config: &VisualizerConfig,
) -> HighDetail {
    let path = texture_for_body(&entry.body);
    let load = ctx
        .assets
        .request(LoadTarget::BodyTexture(entry.body.id), path);

    let position = entry.body.scaled_position(config.distance_factor);
    let material = Material {
        lit: entry.body.kind != BodyKind::Star,
        ..Material::default()
    };
    let node = ctx.scene.add(
        SceneNode::new(
            Shape::Sphere {
                radius: entry.radius,
            },
            material,
        )
        .at(position)
        .hidden(),
    );
    ctx.composer.outline.select(node);

    tracing::debug!(body = %entry.body.name, %path, "Loading high-detail body");
    HighDetail {
        node,
        load,
        texture: TextureState::Loading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrbitParent, PlanetRecord};
    use bevy::math::DVec3;

    fn config() -> VisualizerConfig {
        VisualizerConfig {
            distance_factor: 1.0,
            ..Default::default()
        }
    }

    fn catalog() -> BodyCatalog {
        let sun = PlanetRecord {
            id: 1,
            name: "The Sun".to_string(),
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            radius: Some(10.0),
            kind: BodyKind::Star,
            orbiting: None,
        };
        let earth = PlanetRecord {
            id: 3,
            name: "Earth".to_string(),
            position_x: 1_000_000.0,
            position_y: 0.0,
            position_z: 0.0,
            radius: Some(1.0),
            kind: BodyKind::Planet,
            orbiting: Some(Box::new(sun.clone())),
        };
        BodyCatalog::from_records(vec![sun, earth])
    }

    fn setup() -> (BodyRegistry, RenderContext, VisualizerConfig) {
        let config = config();
        let mut ctx = RenderContext::create(&config, 800, 600);
        let mut registry = BodyRegistry::default();
        registry.build(&catalog(), &mut ctx, &config);
        (registry, ctx, config)
    }

    fn opacity(ctx: &RenderContext, node: NodeId) -> f32 {
        ctx.scene.get(node).unwrap().material.opacity
    }

    #[test]
    fn test_build_once() {
        let (mut registry, mut ctx, config) = setup();
        let nodes = ctx.scene.len();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lights().len(), 2);
        assert_eq!(registry.build(&catalog(), &mut ctx, &config), 0);
        assert_eq!(ctx.scene.len(), nodes);
    }

    #[test]
    fn test_orbit_line_only_for_children() {
        let (registry, ctx, _) = setup();
        let sun = registry.get(BodyId(1)).unwrap();
        let earth = registry.get(BodyId(3)).unwrap();

        assert!(sun.orbit_line.is_none());
        let line = ctx.scene.get(earth.orbit_line.unwrap()).unwrap();
        assert_eq!(line.position, DVec3::ZERO);
        assert_eq!(line.scale, 1_000_000.0);
        assert_eq!(line.material.blending, Blending::Additive);
        assert_eq!(
            earth.body.orbiting,
            Some(OrbitParent {
                id: BodyId(1),
                name: "The Sun".to_string(),
                position: DVec3::ZERO
            })
        );
    }

    #[test]
    fn test_far_body_stays_placeholder() {
        let (mut registry, mut ctx, config) = setup();
        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 10_000.0);

        registry.update_lod(&mut ctx, &config);

        let earth = registry.get(BodyId(3)).unwrap();
        assert!(earth.high_detail.is_none());
        assert_eq!(opacity(&ctx, earth.placeholder), 1.0);
        assert_eq!(ctx.scene.get(earth.placeholder).unwrap().scale, 20.0);
        assert_eq!(opacity(&ctx, earth.orbit_line.unwrap()), 1.0);
    }

    #[test]
    fn test_steady_camera_leaves_placeholders_untouched() {
        let (mut registry, mut ctx, config) = setup();
        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 10_000.0);
        registry.update_lod(&mut ctx, &config);

        let placeholder = registry.get(BodyId(3)).unwrap().placeholder;
        let revision = ctx.scene.get(placeholder).unwrap().revision();
        registry.update_lod(&mut ctx, &config);

        assert_eq!(ctx.scene.get(placeholder).unwrap().revision(), revision);
    }

    #[test]
    fn test_close_body_loads_once_and_blends_after_texture() {
        let (mut registry, mut ctx, config) = setup();
        // factor = 250 / 1 / 500 = 0.5
        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 250.0);

        registry.update_lod(&mut ctx, &config);
        registry.update_lod(&mut ctx, &config);

        let requests = ctx.assets.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "models/earth.jpg");

        let hd_node = registry.get(BodyId(3)).unwrap().high_detail.as_ref().unwrap().node;
        let placeholder = registry.get(BodyId(3)).unwrap().placeholder;
        // Still loading: placeholder only
        assert!(!ctx.scene.get(hd_node).unwrap().visible);
        assert_eq!(opacity(&ctx, placeholder), 1.0);

        let request = &requests[0];
        assert!(registry.on_texture_loaded(request.id, &LoadOutcome::Texture, &request.path, &mut ctx));
        registry.update_lod(&mut ctx, &config);

        assert!(ctx.scene.get(hd_node).unwrap().visible);
        assert_eq!(opacity(&ctx, placeholder), 0.125);
        assert!(ctx.composer.outline.is_selected(hd_node));
    }

    #[test]
    fn test_failed_texture_keeps_placeholder() {
        let (mut registry, mut ctx, config) = setup();
        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 250.0);
        registry.update_lod(&mut ctx, &config);
        let request = ctx.assets.take_requests().remove(0);

        registry.on_texture_loaded(
            request.id,
            &LoadOutcome::Failed("404".to_string()),
            &request.path,
            &mut ctx,
        );
        registry.update_lod(&mut ctx, &config);

        let earth = registry.get(BodyId(3)).unwrap();
        assert_eq!(earth.high_detail.as_ref().unwrap().texture, TextureState::Failed);
        assert_eq!(opacity(&ctx, earth.placeholder), 1.0);
        assert!(ctx.assets.take_requests().is_empty());
    }

    #[test]
    fn test_high_detail_survives_moving_away() {
        let (mut registry, mut ctx, config) = setup();
        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 250.0);
        registry.update_lod(&mut ctx, &config);

        ctx.camera.position = DVec3::new(1_000_000.0, 0.0, 100_000.0);
        registry.update_lod(&mut ctx, &config);

        let earth = registry.get(BodyId(3)).unwrap();
        assert!(earth.is_high_detail_loaded());
        assert!(ctx.scene.contains(earth.high_detail.as_ref().unwrap().node));
    }

    #[test]
    fn test_star_is_unlit() {
        let (mut registry, mut ctx, config) = setup();
        ctx.camera.position = DVec3::new(0.0, 0.0, 1000.0);
        registry.update_lod(&mut ctx, &config);

        let hd = registry.get(BodyId(1)).unwrap().high_detail.as_ref().unwrap().node;
        assert!(!ctx.scene.get(hd).unwrap().material.lit);
    }

    #[test]
    fn test_unknown_load_is_ignored() {
        let (mut registry, mut ctx, _) = setup();
        let id = ctx.assets.request(LoadTarget::SkyTexture, "models/space.jpg");
        assert!(!registry.on_texture_loaded(id, &LoadOutcome::Texture, "x", &mut ctx));
    }
}
