//! Expanding "ping" rings marking where each visible user is.

use std::collections::BTreeMap;

use bevy::color::Srgba;
use bevy::math::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assets::parse_color;
use super::scene::{Material, NodeId, RenderContext, SceneNode, Shape};
use super::scheduler::{Scheduler, TimerId};
use super::tween::{Easing, Tween};
use crate::config::VisualizerConfig;
use crate::models::PlayerKinematicState;

const PING_SEGMENTS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PingId(u64);

/// Timer payloads driving the pings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingTask {
    Spawn { username: String },
    Expire(PingId),
}

#[derive(Debug, Clone)]
struct WatchedUser {
    position: DVec3,
    color: Srgba,
    interval: TimerId,
}

#[derive(Debug, Clone)]
pub struct Ping {
    pub username: String,
    pub node: NodeId,
    /// Camera distance at spawn time, divided down.
    pub scale_distance: f64,
    pub radius: Tween<f64>,
}

#[derive(Debug)]
pub struct PresencePings {
    watched: BTreeMap<String, WatchedUser>,
    active: BTreeMap<PingId, Ping>,
    next_id: u64,
    rng: StdRng,
}

impl Default for PresencePings {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl PresencePings {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            watched: BTreeMap::new(),
            active: BTreeMap::new(),
            next_id: 0,
            rng,
        }
    }

    pub fn watched_users(&self) -> impl Iterator<Item = &str> {
        self.watched.keys().map(String::as_str)
    }

    pub fn active(&self) -> impl Iterator<Item = (PingId, &Ping)> {
        self.active.iter().map(|(id, ping)| (*id, ping))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Replace the watched user set: cancel every spawn interval and start
    /// one per user. Rings already on screen finish on their own timers.
    pub fn restart(
        &mut self,
        users: &[&PlayerKinematicState],
        scheduler: &mut Scheduler<PingTask>,
        config: &VisualizerConfig,
    ) {
        self.cancel_intervals(scheduler);

        for user in users {
            if self.watched.contains_key(&user.username) {
                continue;
            }
            let color = parse_color(&user.color).unwrap_or_else(|err| {
                tracing::warn!(user = %user.username, error = %err, "Unusable ping color, using white");
                Srgba::WHITE
            });
            let period = config.ping_interval_ms + self.rng.gen::<f64>() * config.ping_jitter_ms;
            let interval = scheduler.set_interval(
                period,
                PingTask::Spawn {
                    username: user.username.clone(),
                },
            );
            self.watched.insert(
                user.username.clone(),
                WatchedUser {
                    position: user.scaled_position(config.distance_factor),
                    color,
                    interval,
                },
            );
        }
        tracing::debug!(users = self.watched.len(), "Restarted presence pings");
    }

    pub fn cancel_intervals(&mut self, scheduler: &mut Scheduler<PingTask>) {
        for user in self.watched.values() {
            scheduler.clear(user.interval);
        }
        self.watched.clear();
    }

    /// Handle a fired timer.
    pub fn on_task(
        &mut self,
        task: PingTask,
        ctx: &mut RenderContext,
        scheduler: &mut Scheduler<PingTask>,
        config: &VisualizerConfig,
    ) {
        match task {
            PingTask::Spawn { username } => self.spawn(&username, ctx, scheduler, config),
            PingTask::Expire(id) => {
                if let Some(ping) = self.active.remove(&id) {
                    ctx.scene.remove(ping.node);
                }
            }
        }
    }

    fn spawn(
        &mut self,
        username: &str,
        ctx: &mut RenderContext,
        scheduler: &mut Scheduler<PingTask>,
        config: &VisualizerConfig,
    ) {
        let Some(user) = self.watched.get(username) else {
            return;
        };
        let now = scheduler.now();
        let scale_distance = ctx.camera.position.distance(user.position) / config.ping_distance_divisor;
        let radius = Tween::new(
            config.ping_start_radius,
            config.ping_end_radius,
            now,
            config.ping_duration_ms,
            Easing::QuadraticOut,
        );

        let mut node = SceneNode::new(
            Shape::Circle {
                segments: PING_SEGMENTS,
            },
            Material::unlit(user.color),
        )
        .at(user.position);
        apply_ping_style(&mut node, &radius, scale_distance, now, config);
        let node = ctx.scene.add(node);

        self.next_id += 1;
        let id = PingId(self.next_id);
        scheduler.set_timeout(config.ping_duration_ms, PingTask::Expire(id));
        self.active.insert(
            id,
            Ping {
                username: username.to_string(),
                node,
                scale_distance,
                radius,
            },
        );
    }

    /// Grow and fade every live ring.
    pub fn update(&mut self, now_ms: f64, ctx: &mut RenderContext, config: &VisualizerConfig) {
        for ping in self.active.values() {
            if let Some(node) = ctx.scene.node_mut(ping.node) {
                apply_ping_style(node, &ping.radius, ping.scale_distance, now_ms, config);
            }
        }
    }

    /// Forget every ring without touching the scene. Used on teardown.
    pub fn clear(&mut self, scheduler: &mut Scheduler<PingTask>) {
        self.cancel_intervals(scheduler);
        self.active.clear();
    }
}

fn apply_ping_style(
    node: &mut SceneNode,
    radius: &Tween<f64>,
    scale_distance: f64,
    now_ms: f64,
    config: &VisualizerConfig,
) {
    let r = radius.value_at(now_ms);
    node.scale = r * scale_distance;
    // Rings right at the camera stay opaque until they expire
    node.material.opacity = if scale_distance > config.ping_min_distance {
        (config.ping_end_radius - r).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyId, BodyKind, CelestialBody, UserStatus};

    fn config() -> VisualizerConfig {
        VisualizerConfig {
            distance_factor: 1.0,
            ..Default::default()
        }
    }

    fn user(name: &str, x: f64) -> PlayerKinematicState {
        PlayerKinematicState {
            username: name.to_string(),
            status: UserStatus::Landed,
            position: DVec3::new(x, 0.0, 0.0),
            velocity: DVec3::ZERO,
            body: CelestialBody {
                id: BodyId(1),
                name: "Earth".to_string(),
                kind: BodyKind::Planet,
                position: DVec3::ZERO,
                radius: None,
                orbiting: None,
            },
            color: "#00ff00".to_string(),
            server_time: chrono::Utc::now(),
            landing_time: None,
            next_boost: None,
            speed: 0.0,
            groups: Vec::new(),
            items: Vec::new(),
            notification: None,
        }
    }

    struct Harness {
        pings: PresencePings,
        scheduler: Scheduler<PingTask>,
        ctx: RenderContext,
        config: VisualizerConfig,
    }

    impl Harness {
        fn new() -> Self {
            let config = config();
            let mut ctx = RenderContext::create(&config, 100, 100);
            ctx.camera.position = DVec3::new(0.0, 0.0, 7500.0);
            Self {
                pings: PresencePings::with_rng(StdRng::seed_from_u64(3)),
                scheduler: Scheduler::new(),
                ctx,
                config,
            }
        }

        fn tick(&mut self, now: f64) {
            for task in self.scheduler.advance(now) {
                self.pings.on_task(task, &mut self.ctx, &mut self.scheduler, &self.config);
            }
            self.pings.update(now, &mut self.ctx, &self.config);
        }
    }

    #[test]
    fn test_one_interval_per_user() {
        let mut h = Harness::new();
        let (a, b) = (user("ada", 0.0), user("grace", 5.0));

        h.pings.restart(&[&a, &b], &mut h.scheduler, &h.config);
        assert_eq!(h.scheduler.pending_timers(), 2);

        h.pings.restart(&[&a], &mut h.scheduler, &h.config);
        assert_eq!(h.scheduler.pending_timers(), 1);
        assert_eq!(h.pings.watched_users().collect::<Vec<_>>(), vec!["ada"]);
    }

    #[test]
    fn test_ping_spawns_grows_and_expires() {
        let mut h = Harness::new();
        let a = user("ada", 0.0);
        h.pings.restart(&[&a], &mut h.scheduler, &h.config);

        h.tick(1100.0);
        assert_eq!(h.pings.active_count(), 1);
        let (_, ping) = h.pings.active().next().unwrap();
        let node = ping.node;
        assert_eq!(ping.scale_distance, 10.0);
        assert_eq!(h.ctx.scene.get(node).unwrap().scale, 10.0);
        assert_eq!(h.ctx.scene.get(node).unwrap().material.opacity, 1.0);

        h.tick(1600.0);
        let grown = h.ctx.scene.get(node).unwrap().scale;
        assert!(grown > 10.0 && grown < 100.0);

        h.tick(2100.0);
        assert!(!h.ctx.scene.contains(node));
    }

    #[test]
    fn test_close_pings_fade_later_than_far_ones() {
        let mut far = Harness::new();
        let mut close = Harness::new();
        close.ctx.camera.position = DVec3::new(0.0, 0.0, 0.5);
        let a = user("ada", 0.0);

        let mut nodes = Vec::new();
        for h in [&mut far, &mut close] {
            h.pings.restart(&[&a], &mut h.scheduler, &h.config);
            h.tick(1100.0);
            let (_, ping) = h.pings.active().next().unwrap();
            nodes.push(ping.node);
            assert_eq!(h.ctx.scene.get(ping.node).unwrap().material.opacity, 1.0);
        }

        // Nine tenths through the ring's life
        far.pings.update(2000.0, &mut far.ctx, &far.config);
        close.pings.update(2000.0, &mut close.ctx, &close.config);

        let far_opacity = far.ctx.scene.get(nodes[0]).unwrap().material.opacity;
        let close_opacity = close.ctx.scene.get(nodes[1]).unwrap().material.opacity;
        assert!(far_opacity < 0.5);
        assert_eq!(close_opacity, 1.0);
    }

    #[test]
    fn test_restart_keeps_live_rings() {
        let mut h = Harness::new();
        let a = user("ada", 0.0);
        h.pings.restart(&[&a], &mut h.scheduler, &h.config);
        h.tick(1100.0);

        h.pings.restart(&[], &mut h.scheduler, &h.config);
        assert_eq!(h.pings.active_count(), 1);

        h.tick(2200.0);
        assert_eq!(h.pings.active_count(), 0);
    }

    #[test]
    fn test_expire_after_scene_cleared_is_harmless() {
        let mut h = Harness::new();
        let a = user("ada", 0.0);
        h.pings.restart(&[&a], &mut h.scheduler, &h.config);
        h.tick(1100.0);
        h.pings.restart(&[], &mut h.scheduler, &h.config);

        h.ctx.scene.clear();
        h.tick(2200.0);

        assert_eq!(h.pings.active_count(), 0);
    }
}
