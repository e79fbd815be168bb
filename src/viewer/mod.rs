//! Bevy front-end for the visualizer core.
//!
//! Opens a window, feeds state snapshots and input to the
//! [`StateBridge`](crate::visualizer::StateBridge), and mirrors its scene
//! graph into entities every frame.
//!
//! ## Module Structure
//!
//! - `components` - ECS components linking entities to scene nodes
//! - `resources` - ECS resources (the core, feed receiver, mirror state)
//! - `systems` - ECS systems (feed, input, frame, assets, sync, HUD)
//! - `setup` - Camera, HUD and surface attachment
//! - `plugin` - Bevy plugin definition
//! - `constants` - Window, mesh, lighting and input constants

mod components;
mod constants;
mod plugin;
mod resources;
mod setup;
mod systems;

pub use plugin::ViewerPlugin;

use std::path::PathBuf;

use bevy::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::VisualizerConfig;
use crate::feed::{FeedEvent, FeedHandle};
use crate::visualizer::StateBridge;
use constants::{CLEAR_COLOR, WINDOW_SIZE, WINDOW_TITLE};

/// Run the viewer on the current thread.
///
/// Blocks until the window is closed.
pub fn run_viewer(
    config: &VisualizerConfig,
    events: UnboundedReceiver<FeedEvent>,
    handle: FeedHandle,
) {
    let (width, height) = WINDOW_SIZE;
    let bridge = StateBridge::new(config.clone(), width as u32, height as u32);
    // Bevy resolves relative asset paths against the executable, not the cwd
    let asset_root = std::fs::canonicalize(&config.asset_root)
        .unwrap_or_else(|_| PathBuf::from(&config.asset_root));

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: WINDOW_TITLE.to_string(),
                        resolution: WINDOW_SIZE.into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: asset_root.to_string_lossy().into_owned(),
                    ..default()
                }),
        )
        .insert_resource(ClearColor(CLEAR_COLOR))
        .add_plugins(ViewerPlugin::new(bridge, events, handle, asset_root))
        .run();
}
