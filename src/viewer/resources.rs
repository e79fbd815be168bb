//! ECS resources for the viewer.
//!
//! Resources are global singleton data - there's only one instance
//! of each resource in the entire app.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use bevy::prelude::*;
use bevy::tasks::Task;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::feed::{FeedEvent, FeedHandle};
use crate::visualizer::{Container, ElementId, LoadId, NodeId, ShipModel, StateBridge};

// =============================================================================
// Visualizer Core
// =============================================================================

/// The visualizer core. Exactly one per app.
#[derive(Resource)]
pub struct VisualizerRes(pub StateBridge);

/// The window, acting as the container of the render surface.
#[derive(Resource, Default)]
pub struct SurfaceHost {
    children: Vec<ElementId>,
}

impl Container for SurfaceHost {
    fn contains(&self, element: ElementId) -> bool {
        self.children.contains(&element)
    }

    fn append_child(&mut self, element: ElementId) {
        self.children.push(element);
    }
}

// =============================================================================
// State Feed
// =============================================================================

/// Receiving end of the state feed.
///
/// Wrapped in Mutex because Bevy resources must be Send + Sync.
#[derive(Resource)]
pub struct FeedRes {
    pub events: Mutex<UnboundedReceiver<FeedEvent>>,
    pub handle: FeedHandle,
}

// =============================================================================
// Scene Mirror
// =============================================================================

/// An entity standing in for a scene node.
pub struct MirroredNode {
    pub entity: Entity,
    pub revision: u64,
    /// One material per mesh, in `SceneNode::mesh_materials` order.
    pub materials: Vec<Handle<StandardMaterial>>,
    pub outlined: bool,
}

#[derive(Resource, Default)]
pub struct NodeEntities(pub HashMap<NodeId, MirroredNode>);

// =============================================================================
// Assets
// =============================================================================

/// Loaded textures by asset path.
#[derive(Resource, Default)]
pub struct TextureCache(pub HashMap<String, Handle<Image>>);

/// Loads started on behalf of the core and not yet reported back.
#[derive(Resource, Default)]
pub struct PendingLoads {
    pub textures: Vec<(LoadId, String, Handle<Image>)>,
    pub models: Vec<(LoadId, Task<Result<ShipModel, String>>)>,
}

/// Directory the ship model file is read from.
#[derive(Resource)]
pub struct AssetRoot(pub PathBuf);

// =============================================================================
// Interaction State
// =============================================================================

#[derive(Resource, Default)]
pub struct ClickState {
    /// Time of the last left click, in seconds since startup.
    pub last_click: Option<f64>,
}
