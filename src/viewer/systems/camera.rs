//! Camera transform, copied from the core camera every frame.

use bevy::prelude::*;

use crate::viewer::resources::VisualizerRes;

pub fn camera_sync_system(
    visualizer: Res<VisualizerRes>,
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
) {
    let camera = &visualizer.0.context().camera;
    if !camera.position.is_finite() {
        return;
    }
    if let Ok(mut transform) = camera_query.get_single_mut() {
        *transform = Transform::from_translation(camera.position.as_vec3())
            .looking_at(camera.look_at.as_vec3(), camera.up.as_vec3());
    }
}
