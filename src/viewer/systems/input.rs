//! Mouse and keyboard input.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::viewer::constants::{DOUBLE_CLICK_SECS, ORBIT_SENSITIVITY, PIXELS_PER_LINE, ZOOM_STEP};
use crate::viewer::resources::{ClickState, FeedRes, VisualizerRes};

/// Camera input system.
///
/// Controls:
/// - Left or right drag: Orbit around the ship
/// - Scroll wheel: Zoom
/// - Double-click: Shift between follow and overhead views
/// - R: Rocket (follow) view
/// - O: Overhead view
/// - F5: Refresh player state
pub fn camera_input_system(
    mut visualizer: ResMut<VisualizerRes>,
    mut clicks: ResMut<ClickState>,
    feed: Res<FeedRes>,
    time: Res<Time<Real>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll: EventReader<MouseWheel>,
) {
    let bridge = &mut visualizer.0;

    if mouse_button.pressed(MouseButton::Left) || mouse_button.pressed(MouseButton::Right) {
        for ev in mouse_motion.read() {
            bridge.rotate(
                -ev.delta.x as f64 * ORBIT_SENSITIVITY,
                -ev.delta.y as f64 * ORBIT_SENSITIVITY,
            );
        }
    } else {
        mouse_motion.clear();
    }

    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_LINE,
        };
        bridge.dolly(ZOOM_STEP.powf(lines as f64));
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        let now = time.elapsed_secs_f64();
        match clicks.last_click {
            Some(last) if now - last < DOUBLE_CLICK_SECS => {
                bridge.trigger_view_shift();
                clicks.last_click = None;
            }
            _ => clicks.last_click = Some(now),
        }
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        bridge.enter_follow_view();
    }
    if keyboard.just_pressed(KeyCode::KeyO) {
        bridge.enter_overhead_view();
    }
    if keyboard.just_pressed(KeyCode::F5) {
        feed.handle.invalidate();
    }
}
