//! Viewer plugin for Bevy.

use std::path::PathBuf;
use std::sync::Mutex;

use bevy::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

use super::resources::{
    AssetRoot, ClickState, FeedRes, NodeEntities, PendingLoads, SurfaceHost, TextureCache,
    VisualizerRes,
};
use super::setup::{attach_surface, setup_scene};
use super::systems;
use crate::feed::{FeedEvent, FeedHandle};
use crate::visualizer::StateBridge;

/// Plugin that mirrors a [`StateBridge`] into a Bevy window.
///
/// The core and the feed receiver use `Mutex<Option<...>>` so ownership can
/// move into resources during `build()` (which takes `&self`).
pub struct ViewerPlugin {
    /// Visualizer core (taken during build).
    pub bridge: Mutex<Option<StateBridge>>,
    /// State feed receiver and its refresh handle (taken during build).
    pub feed: Mutex<Option<(UnboundedReceiver<FeedEvent>, FeedHandle)>>,
    /// Directory the ship model is read from.
    pub asset_root: PathBuf,
}

impl ViewerPlugin {
    pub fn new(
        bridge: StateBridge,
        events: UnboundedReceiver<FeedEvent>,
        handle: FeedHandle,
        asset_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bridge: Mutex::new(Some(bridge)),
            feed: Mutex::new(Some((events, handle))),
            asset_root: asset_root.into(),
        }
    }
}

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        // Take ownership of the core and the feed (moves them out, leaves None)
        let bridge = self.bridge.lock().ok().and_then(|mut b| b.take());
        let feed = self.feed.lock().ok().and_then(|mut f| f.take());
        let (Some(bridge), Some((events, handle))) = (bridge, feed) else {
            tracing::error!("ViewerPlugin added twice, ignoring");
            return;
        };

        app.insert_resource(VisualizerRes(bridge))
            .insert_resource(FeedRes {
                events: Mutex::new(events),
                handle,
            })
            .insert_resource(AssetRoot(self.asset_root.clone()))
            .init_resource::<SurfaceHost>()
            .init_resource::<NodeEntities>()
            .init_resource::<TextureCache>()
            .init_resource::<PendingLoads>()
            .init_resource::<ClickState>()
            .add_systems(Startup, (setup_scene, attach_surface).chain())
            .add_systems(
                Update,
                (
                    systems::drain_feed_system,
                    systems::camera_input_system,
                    systems::resize_system,
                    systems::frame_system,
                    systems::start_loads_system,
                    systems::poll_loads_system,
                    systems::sync_scene_system,
                    systems::camera_sync_system,
                    systems::update_hud_system,
                )
                    .chain(),
            )
            .add_systems(Last, systems::teardown_system);
    }
}
