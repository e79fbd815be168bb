//! Performing the core's load requests and reporting completions.

use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures::FutureExt;

use crate::visualizer::{LoadOutcome, LoadTarget, ShipModel};
use crate::viewer::resources::{AssetRoot, PendingLoads, TextureCache, VisualizerRes};

/// Start every load the core queued this frame.
pub fn start_loads_system(
    mut visualizer: ResMut<VisualizerRes>,
    mut pending: ResMut<PendingLoads>,
    asset_server: Res<AssetServer>,
    root: Res<AssetRoot>,
) {
    for request in visualizer.0.take_load_requests() {
        match request.target {
            LoadTarget::BodyTexture(_) | LoadTarget::SkyTexture => {
                let handle: Handle<Image> = asset_server.load(request.path.clone());
                pending.textures.push((request.id, request.path, handle));
            }
            LoadTarget::ShipModel => {
                let path = root.0.join(&request.path);
                let task = IoTaskPool::get().spawn(async move {
                    let json = std::fs::read_to_string(&path)
                        .map_err(|e| format!("{}: {e}", path.display()))?;
                    ShipModel::from_json(&json).map_err(|e| e.to_string())
                });
                pending.models.push((request.id, task));
            }
        }
    }
}

/// Report finished loads back to the core.
pub fn poll_loads_system(
    mut visualizer: ResMut<VisualizerRes>,
    mut pending: ResMut<PendingLoads>,
    mut cache: ResMut<TextureCache>,
    asset_server: Res<AssetServer>,
) {
    let pending = pending.as_mut();

    pending.textures.retain(|(id, path, handle)| {
        let outcome = match asset_server.get_load_state(handle) {
            Some(LoadState::Loaded) => {
                cache.0.insert(path.clone(), handle.clone());
                LoadOutcome::Texture
            }
            Some(LoadState::Failed(err)) => LoadOutcome::Failed(err.to_string()),
            _ => return true,
        };
        visualizer.0.on_asset_loaded(*id, outcome);
        false
    });

    pending.models.retain_mut(|(id, task)| {
        let Some(result) = task.now_or_never() else {
            return true;
        };
        let outcome = match result {
            Ok(model) => LoadOutcome::Model(model),
            Err(reason) => LoadOutcome::Failed(reason),
        };
        visualizer.0.on_asset_loaded(*id, outcome);
        false
    });
}
