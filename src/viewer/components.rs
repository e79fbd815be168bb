//! ECS components for the viewer.

use bevy::prelude::*;

use crate::visualizer::NodeId;

/// Links an entity to the scene node it mirrors.
#[derive(Component)]
pub struct SceneNodeRef(pub NodeId);

/// Back-face hull drawn around an outlined body.
#[derive(Component)]
pub struct OutlineHull;

/// Marker component for the HUD container.
#[derive(Component)]
pub struct HudPanel;

/// Marker component for the HUD text content.
#[derive(Component)]
pub struct HudText;
