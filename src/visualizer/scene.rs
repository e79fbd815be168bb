//! The render root: scene graph, camera, orbit controls, output surface
//! and post-processing chain.
//!
//! Nothing here draws pixels. The scene graph is a retained description
//! that a front-end mirrors into its own engine; every node carries a
//! revision so the mirror only touches what changed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy::color::Srgba;
use bevy::math::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::assets::AssetQueue;
use super::scheduler::Scheduler;
use crate::config::VisualizerConfig;

/// Identity of a node in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Srgba,
    pub opacity: f32,
    /// Asset path of a loaded texture.
    pub texture: Option<String>,
    /// Whether scene lights affect the surface.
    pub lit: bool,
    pub blending: Blending,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Srgba::WHITE,
            opacity: 1.0,
            texture: None,
            lit: false,
            blending: Blending::Normal,
            double_sided: false,
        }
    }
}

impl Material {
    pub fn unlit(color: Srgba) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Primitive shapes a ship model is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum PartShape {
    Cone { radius: f64, height: f64 },
    Cylinder { radius: f64, height: f64 },
    Cuboid { x: f64, y: f64, z: f64 },
    Sphere { radius: f64 },
}

/// One mesh of a composite model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub shape: PartShape,
    /// Offset from the model origin, in model units.
    pub offset: DVec3,
    pub rotation: DQuat,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere { radius: f64 },
    /// Closed unit circle in the XY plane, sized by the node's scale.
    Circle { segments: u32 },
    Model { parts: Vec<MeshPart> },
    /// Inward-facing sphere around the scene.
    Sky { radius: f64 },
    PointLight { intensity: f32 },
    AmbientLight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub shape: Shape,
    pub material: Material,
    pub position: DVec3,
    pub rotation: DQuat,
    pub scale: f64,
    pub visible: bool,
    revision: u64,
}

impl SceneNode {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self {
            shape,
            material,
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: 1.0,
            visible: true,
            revision: 0,
        }
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Bumped on every mutable access through the graph.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Every mesh material of this node: the parts of a model, the node's
    /// own material for a single mesh, nothing for a light.
    pub fn mesh_materials_mut(&mut self) -> Vec<&mut Material> {
        match &mut self.shape {
            Shape::Model { parts } => parts.iter_mut().map(|p| &mut p.material).collect(),
            Shape::PointLight { .. } | Shape::AmbientLight => Vec::new(),
            _ => vec![&mut self.material],
        }
    }

    pub fn mesh_materials(&self) -> Vec<&Material> {
        match &self.shape {
            Shape::Model { parts } => parts.iter().map(|p| &p.material).collect(),
            Shape::PointLight { .. } | Shape::AmbientLight => Vec::new(),
            _ => vec![&self.material],
        }
    }
}

/// Retained scene description.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    removed: Vec<NodeId>,
}

impl SceneGraph {
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        self.removed.push(id);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let node = self.nodes.get_mut(&id)?;
        node.revision += 1;
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        self.removed.extend(ids);
        self.nodes.clear();
    }

    /// Ids removed since the last call, for mirrors to despawn.
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: DVec3,
    /// Point the camera faces.
    pub look_at: DVec3,
    pub up: DVec3,
    pub fov_degrees: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl PerspectiveCamera {
    pub fn new(config: &VisualizerConfig, aspect: f64) -> Self {
        Self {
            position: DVec3::ZERO,
            look_at: DVec3::NEG_Z,
            up: DVec3::Y,
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
        }
    }
}

/// Orbiting camera controller with damping and optional auto-rotation.
///
/// User input accumulates into pending deltas which decay by the damping
/// factor on every [`update`](Self::update).
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: DVec3,
    pub auto_rotate_speed: f64,
    pub damping_factor: f64,
    yaw_delta: f64,
    pitch_delta: f64,
    zoom_scale: f64,
}

const MIN_POLAR: f64 = 1e-6;

impl OrbitControls {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            target: DVec3::ZERO,
            auto_rotate_speed: config.auto_rotate_speed,
            damping_factor: config.damping_factor,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
        }
    }

    pub fn rotate(&mut self, yaw: f64, pitch: f64) {
        self.yaw_delta += yaw;
        self.pitch_delta += pitch;
    }

    /// Scale the camera distance; values below 1 move closer.
    pub fn dolly(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.zoom_scale *= scale;
        }
    }

    /// Apply pending input and auto-rotation to `camera`.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, dt_secs: f64, auto_rotate: bool) {
        let offset = camera.position - self.target;
        let radius = offset.length();

        if radius > 0.0 && radius.is_finite() {
            let mut theta = offset.x.atan2(offset.z);
            let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

            if auto_rotate {
                theta -= std::f64::consts::TAU / 60.0 * self.auto_rotate_speed * dt_secs;
            }
            theta += self.yaw_delta * self.damping_factor;
            phi = (phi + self.pitch_delta * self.damping_factor)
                .clamp(MIN_POLAR, std::f64::consts::PI - MIN_POLAR);
            let radius = radius * self.zoom_scale;

            camera.position = self.target + spherical_to_offset(radius, theta, phi);
        }

        self.yaw_delta *= 1.0 - self.damping_factor;
        self.pitch_delta *= 1.0 - self.damping_factor;
        self.zoom_scale = 1.0;
        camera.look_at = self.target;
    }
}

/// Y-up spherical coordinates to a cartesian offset.
fn spherical_to_offset(radius: f64, theta: f64, phi: f64) -> DVec3 {
    let sin_phi = phi.sin();
    DVec3::new(
        radius * sin_phi * theta.sin(),
        radius * phi.cos(),
        radius * sin_phi * theta.cos(),
    )
}

/// Identity of a host display element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Host container the output surface is attached to.
pub trait Container {
    fn contains(&self, element: ElementId) -> bool;
    fn append_child(&mut self, element: ElementId);
}

/// The output surface.
#[derive(Debug)]
pub struct Renderer {
    surface: ElementId,
    width: u32,
    height: u32,
    frames_rendered: u64,
}

impl Renderer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            surface: ElementId::unique(),
            width,
            height,
            frames_rendered: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FxaaPass {
    /// Reciprocal of the surface size.
    pub resolution: DVec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlinePass {
    pub selected: Vec<NodeId>,
    pub edge_strength: f32,
    pub edge_glow: f32,
    pub edge_thickness: f32,
    pub color: Srgba,
    pub resolution: DVec2,
}

impl OutlinePass {
    pub fn select(&mut self, node: NodeId) {
        if !self.selected.contains(&node) {
            self.selected.push(node);
        }
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected.contains(&node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Render,
    Fxaa,
    Outline,
}

/// Post-processing chain: scene render, then anti-aliasing, then outline.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectComposer {
    pub fxaa: FxaaPass,
    pub outline: OutlinePass,
}

pub const OUTLINE_COLOR: Srgba = Srgba::rgb(25.0 / 255.0, 10.0 / 255.0, 5.0 / 255.0);

impl EffectComposer {
    fn new(width: u32, height: u32) -> Self {
        let mut composer = Self {
            fxaa: FxaaPass {
                resolution: DVec2::ZERO,
            },
            outline: OutlinePass {
                selected: Vec::new(),
                edge_strength: 3.0,
                edge_glow: 0.1,
                edge_thickness: 0.1,
                color: OUTLINE_COLOR,
                resolution: DVec2::ZERO,
            },
        };
        composer.set_size(width, height);
        composer
    }

    pub fn passes(&self) -> [PassKind; 3] {
        [PassKind::Render, PassKind::Fxaa, PassKind::Outline]
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.fxaa.resolution = DVec2::new(1.0 / width as f64, 1.0 / height as f64);
        self.outline.resolution = DVec2::new(width as f64, height as f64);
    }
}

/// Frame bookkeeping: one pending frame request and the previous
/// frame's timestamp.
#[derive(Debug, Default)]
pub struct RenderLoop {
    last_timestamp: Option<f64>,
}

impl RenderLoop {
    pub fn start<T: Clone>(&mut self, scheduler: &mut Scheduler<T>) {
        self.last_timestamp = None;
        scheduler.request_frame();
    }

    /// Consume the pending frame. `None` when no frame was requested.
    pub fn begin<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, timestamp_ms: f64) -> Option<f64> {
        scheduler.take_frame()?;
        Some(match self.last_timestamp {
            Some(last) => (timestamp_ms - last).max(0.0),
            None => 0.0,
        })
    }

    pub fn end<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, timestamp_ms: f64) {
        self.last_timestamp = Some(timestamp_ms);
        scheduler.request_frame();
    }
}

/// Everything the visualizer draws into, owned in one place.
#[derive(Debug)]
pub struct RenderContext {
    pub scene: SceneGraph,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub renderer: Renderer,
    pub composer: EffectComposer,
    pub assets: AssetQueue,
    pub render_loop: RenderLoop,
    disposed: bool,
}

impl RenderContext {
    pub fn create(config: &VisualizerConfig, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            scene: SceneGraph::default(),
            camera: PerspectiveCamera::new(config, width as f64 / height as f64),
            controls: OrbitControls::new(config),
            renderer: Renderer::new(width, height),
            composer: EffectComposer::new(width, height),
            assets: AssetQueue::default(),
            render_loop: RenderLoop::default(),
            disposed: false,
        }
    }

    /// Attach the output surface. Returns `true` only the first time.
    pub fn attach(&mut self, container: &mut dyn Container) -> bool {
        let surface = self.renderer.surface;
        if container.contains(surface) {
            return false;
        }
        container.append_child(surface);
        tracing::debug!(?surface, "Attached render surface");
        true
    }

    /// Track a container resize. Zero-sized dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.aspect = width as f64 / height as f64;
        self.renderer.width = width;
        self.renderer.height = height;
        self.composer.set_size(width, height);
    }

    pub fn render(&mut self) {
        self.renderer.frames_rendered += 1;
    }

    /// Drop all scene content. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scene.clear();
        self.composer.outline.selected.clear();
        self.assets.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
