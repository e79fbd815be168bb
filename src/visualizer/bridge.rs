//! Entry point of the visualizer: owns every component and turns external
//! events (data arrival, resize, frames, asset completions, teardown) into
//! calls on them in a fixed order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assets::{LoadId, LoadOutcome, LoadRequest, LoadTarget};
use super::choreographer::CameraChoreographer;
use super::kinematics::KinematicExtrapolator;
use super::presence::{PingTask, PresencePings};
use super::registry::BodyRegistry;
use super::scene::{Container, Material, NodeId, RenderContext, SceneNode, Shape};
use super::scheduler::{Scheduler, SchedulerStats};
use crate::config::VisualizerConfig;
use crate::models::{BodyCatalog, PlayerKinematicState};

pub struct StateBridge {
    config: VisualizerConfig,
    ctx: RenderContext,
    scheduler: Scheduler<PingTask>,
    registry: BodyRegistry,
    choreographer: CameraChoreographer,
    kinematics: KinematicExtrapolator,
    pings: PresencePings,
    catalog: Option<BodyCatalog>,
    player: Option<PlayerKinematicState>,
    sky: Option<NodeId>,
    camera_placed: bool,
    torn_down: bool,
}

impl StateBridge {
    pub fn new(config: VisualizerConfig, width: u32, height: u32) -> Self {
        Self::with_rng(config, width, height, StdRng::from_entropy())
    }

    /// Deterministic camera offsets and ping jitter, for tests and replays.
    pub fn with_seed(config: VisualizerConfig, width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(config, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: VisualizerConfig, width: u32, height: u32, mut rng: StdRng) -> Self {
        let ctx = RenderContext::create(&config, width, height);
        let choreographer = CameraChoreographer::with_rng(StdRng::seed_from_u64(rng.gen()));
        let pings = PresencePings::with_rng(StdRng::seed_from_u64(rng.gen()));
        Self {
            config,
            ctx,
            scheduler: Scheduler::new(),
            registry: BodyRegistry::default(),
            choreographer,
            kinematics: KinematicExtrapolator::default(),
            pings,
            catalog: None,
            player: None,
            sky: None,
            camera_placed: false,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn choreographer(&self) -> &CameraChoreographer {
        &self.choreographer
    }

    pub fn kinematics(&self) -> &KinematicExtrapolator {
        &self.kinematics
    }

    pub fn pings(&self) -> &PresencePings {
        &self.pings
    }

    pub fn player(&self) -> Option<&PlayerKinematicState> {
        self.player.as_ref()
    }

    pub fn sky(&self) -> Option<NodeId> {
        self.sky
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_timers()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.scheduler.has_pending_frame()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Attach the output surface and start the render loop.
    ///
    /// Repeated calls with a container that already holds the surface do
    /// nothing and return `false`.
    pub fn attach(&mut self, container: &mut dyn Container) -> bool {
        if self.torn_down || !self.ctx.attach(container) {
            return false;
        }
        self.ctx.render_loop.start(&mut self.scheduler);
        true
    }

    /// The catalog is fixed for the session; later catalogs are ignored.
    pub fn on_catalog_loaded(&mut self, catalog: BodyCatalog) {
        if self.torn_down {
            return;
        }
        if self.catalog.as_ref().is_some_and(|c| !c.is_empty()) {
            tracing::debug!("Catalog already loaded, ignoring update");
            return;
        }
        tracing::info!(bodies = catalog.len(), "Catalog loaded");
        self.catalog = Some(catalog);
        self.sync();
    }

    pub fn on_player_state_changed(&mut self, state: PlayerKinematicState) {
        if self.torn_down {
            return;
        }
        tracing::debug!(user = %state.username, status = %state.status, body = %state.body.name, "Player state changed");
        self.player = Some(state);
        self.sync();
    }

    /// Apply the latest catalog and snapshot. Waits until both exist.
    fn sync(&mut self) {
        let (Some(catalog), Some(player)) = (self.catalog.as_ref(), self.player.as_ref()) else {
            return;
        };
        let config = &self.config;
        let ctx = &mut self.ctx;

        if self.registry.is_empty() && self.registry.build(catalog, ctx, config) > 0 {
            self.sky = Some(add_sky(ctx, config));
            self.kinematics.request_model(ctx, config);
        }
        if self.registry.is_empty() {
            tracing::debug!("No bodies yet, holding off on the snapshot");
            return;
        }

        let player_position = player.scaled_position(config.distance_factor);
        if let Some(sky) = self.sky.and_then(|id| ctx.scene.node_mut(id)) {
            sky.position = player_position;
        }

        if !self.camera_placed {
            self.choreographer.place_initial(player, &mut ctx.camera, config);
            self.camera_placed = true;
        }
        self.choreographer
            .observe(player, &ctx.camera, self.scheduler.now(), config);

        self.kinematics.apply_snapshot(player, ctx, config);
        self.pings
            .restart(&player.visible_users(), &mut self.scheduler, config);
        self.registry.update_lod(ctx, config);
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Fire every timer due at `now_ms`.
    pub fn on_timer_tick(&mut self, now_ms: f64) {
        if self.torn_down {
            return;
        }
        for task in self.scheduler.advance(now_ms) {
            self.pings
                .on_task(task, &mut self.ctx, &mut self.scheduler, &self.config);
        }
    }

    /// Run one frame. Returns `false` when no frame was pending.
    pub fn on_animation_frame(&mut self, timestamp_ms: f64) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(delta_ms) = self.ctx.render_loop.begin(&mut self.scheduler, timestamp_ms) else {
            return false;
        };

        self.on_timer_tick(timestamp_ms);

        self.kinematics
            .advance(delta_ms, &mut self.ctx, &mut self.choreographer, &self.config);

        // Controls first so a finishing transition lands exactly on its target
        let auto_rotate = !self.choreographer.is_animating();
        self.ctx
            .controls
            .update(&mut self.ctx.camera, delta_ms / 1000.0, auto_rotate);
        self.choreographer.update(timestamp_ms, &mut self.ctx.camera);

        self.registry.update_lod(&mut self.ctx, &self.config);
        self.pings.update(timestamp_ms, &mut self.ctx, &self.config);

        self.ctx.render();
        self.ctx.render_loop.end(&mut self.scheduler, timestamp_ms);
        true
    }

    /// Loads the host should start.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        self.ctx.assets.take_requests()
    }

    pub fn on_asset_loaded(&mut self, id: LoadId, outcome: LoadOutcome) {
        let Some(request) = self.ctx.assets.resolve(id) else {
            tracing::debug!(?id, "Ignoring completion of unknown or cancelled load");
            return;
        };

        match (request.target, outcome) {
            (LoadTarget::BodyTexture(_), outcome) => {
                self.registry
                    .on_texture_loaded(id, &outcome, &request.path, &mut self.ctx);
            }
            (LoadTarget::SkyTexture, LoadOutcome::Texture) => {
                if let Some(sky) = self.sky.and_then(|id| self.ctx.scene.node_mut(id)) {
                    sky.material.texture = Some(request.path);
                }
            }
            (LoadTarget::SkyTexture, LoadOutcome::Failed(reason)) => {
                tracing::warn!(path = %request.path, %reason, "Sky texture failed to load");
            }
            (LoadTarget::ShipModel, LoadOutcome::Model(model)) => {
                self.kinematics.on_model_loaded(model, &mut self.ctx, &self.config);
            }
            (LoadTarget::ShipModel, LoadOutcome::Failed(reason)) => {
                self.kinematics.on_model_failed(&reason);
            }
            (target, _) => {
                tracing::warn!(?target, path = %request.path, "Asset loaded as the wrong kind");
                if target == LoadTarget::ShipModel {
                    self.kinematics.on_model_failed("not a model");
                }
            }
        }
    }

    pub fn enter_follow_view(&mut self) {
        if let Some(player) = &self.player {
            self.choreographer
                .enter_follow_view(player, &self.ctx.camera, self.scheduler.now(), &self.config);
        }
    }

    pub fn enter_overhead_view(&mut self) {
        if let Some(player) = &self.player {
            self.choreographer
                .enter_overhead_view(player, &self.ctx.camera, self.scheduler.now(), &self.config);
        }
    }

    /// Double-click on the viewport.
    pub fn trigger_view_shift(&mut self) {
        if let Some(player) = &self.player {
            self.choreographer
                .trigger_view_shift(player, &self.ctx.camera, self.scheduler.now(), &self.config);
        }
    }

    pub fn rotate(&mut self, yaw: f64, pitch: f64) {
        self.ctx.controls.rotate(yaw, pitch);
    }

    pub fn dolly(&mut self, scale: f64) {
        self.ctx.controls.dolly(scale);
    }

    /// Scene nodes removed since the last call.
    pub fn take_removed_nodes(&mut self) -> Vec<NodeId> {
        self.ctx.scene.take_removed()
    }

    /// Stop everything and drop all scene content. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.pings.clear(&mut self.scheduler);
        self.scheduler.clear_all();
        self.scheduler.cancel_frame();
        self.ctx.dispose();
        self.registry.clear();
        self.kinematics.reset();
        self.choreographer.reset();
        self.sky = None;
        self.torn_down = true;
        tracing::info!("Visualizer torn down");
    }
}

fn add_sky(ctx: &mut RenderContext, config: &VisualizerConfig) -> NodeId {
    ctx.assets
        .request(LoadTarget::SkyTexture, config.sky_texture.clone());
    ctx.scene.add(SceneNode::new(
        Shape::Sky {
            radius: config.sky_radius,
        },
        Material {
            double_sided: true,
            ..Material::default()
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyId, BodyKind, CelestialBody, PlanetRecord, UserStatus};
    use crate::visualizer::assets::ShipModel;
    use crate::visualizer::scene::ElementId;
    use bevy::math::DVec3;

    #[derive(Default)]
    struct Div(Vec<ElementId>);

    impl Container for Div {
        fn contains(&self, element: ElementId) -> bool {
            self.0.contains(&element)
        }

        fn append_child(&mut self, element: ElementId) {
            self.0.push(element);
        }
    }

    fn config() -> VisualizerConfig {
        VisualizerConfig {
            distance_factor: 1.0,
            ..Default::default()
        }
    }

    fn catalog() -> BodyCatalog {
        BodyCatalog::from_records(vec![PlanetRecord {
            id: 1,
            name: "The Sun".to_string(),
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            radius: Some(100.0),
            kind: BodyKind::Star,
            orbiting: None,
        }])
    }

    fn player() -> PlayerKinematicState {
        PlayerKinematicState {
            username: "ada".to_string(),
            status: UserStatus::Traveling,
            position: DVec3::new(1000.0, 0.0, 0.0),
            velocity: DVec3::ZERO,
            body: CelestialBody {
                id: BodyId(1),
                name: "The Sun".to_string(),
                kind: BodyKind::Star,
                position: DVec3::ZERO,
                radius: Some(100.0),
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

    #[test]
    fn test_waits_for_both_inputs() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);

        bridge.on_player_state_changed(player());
        assert!(bridge.registry().is_empty());
        assert_eq!(bridge.pending_timers(), 0);

        bridge.on_catalog_loaded(catalog());
        assert_eq!(bridge.registry().len(), 1);
        assert_eq!(bridge.pending_timers(), 1);
        assert!(bridge.sky().is_some());
    }

    #[test]
    fn test_empty_catalog_holds_off_until_bodies_arrive() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);
        let camera = bridge.context().camera.position;

        bridge.on_catalog_loaded(BodyCatalog::default());
        bridge.on_player_state_changed(player());
        assert!(bridge.registry().is_empty());
        assert_eq!(bridge.pending_timers(), 0);
        assert_eq!(bridge.context().camera.position, camera);
        assert!(bridge.take_load_requests().is_empty());

        bridge.on_catalog_loaded(catalog());
        assert_eq!(bridge.registry().len(), 1);
        assert_eq!(bridge.pending_timers(), 1);
    }

    #[test]
    fn test_initial_camera_placement_is_immediate() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);
        bridge.on_catalog_loaded(catalog());
        bridge.on_player_state_changed(player());

        let camera = bridge.context().camera.position;
        assert!((camera - DVec3::new(1000.0, 0.0, 0.0)).length() <= 0.010001);
        assert!(!bridge.choreographer().is_animating());
    }

    #[test]
    fn test_frames_only_run_when_requested() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);
        assert!(!bridge.on_animation_frame(0.0));

        let mut div = Div::default();
        assert!(bridge.attach(&mut div));
        assert!(bridge.on_animation_frame(16.0));
        assert!(bridge.on_animation_frame(32.0));
        assert_eq!(bridge.context().renderer.frames_rendered(), 2);
    }

    #[test]
    fn test_loads_are_routed_by_target() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);
        bridge.on_catalog_loaded(catalog());
        bridge.on_player_state_changed(player());

        let requests = bridge.take_load_requests();
        let sky = requests.iter().find(|r| r.target == LoadTarget::SkyTexture).unwrap();
        let ship = requests.iter().find(|r| r.target == LoadTarget::ShipModel).unwrap();

        bridge.on_asset_loaded(sky.id, LoadOutcome::Texture);
        let model = ShipModel::from_json(r#"{"parts": [{"name": "hull", "shape": "sphere", "radius": 1}]}"#).unwrap();
        bridge.on_asset_loaded(ship.id, LoadOutcome::Model(model));

        let sky_node = bridge.context().scene.get(bridge.sky().unwrap()).unwrap();
        assert_eq!(sky_node.material.texture.as_deref(), Some("models/space.jpg"));
        assert!(bridge.kinematics().ship().is_some());
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut bridge = StateBridge::with_seed(config(), 800, 600, 1);
        let mut div = Div::default();
        bridge.attach(&mut div);
        bridge.on_catalog_loaded(catalog());
        bridge.on_player_state_changed(player());

        bridge.teardown();
        bridge.teardown();

        assert!(bridge.is_torn_down());
        assert!(bridge.context().scene.is_empty());
        assert!(bridge.registry().is_empty());
        assert_eq!(bridge.pending_timers(), 0);
        assert!(!bridge.has_pending_frame());
        assert!(!bridge.on_animation_frame(100.0));
    }
}
