//! HUD text: who, where, and how far.

use bevy::prelude::*;

use crate::models::{calculate_dist, format_distance, PlayerKinematicState};
use crate::viewer::components::HudText;
use crate::viewer::resources::VisualizerRes;

pub fn update_hud_system(
    visualizer: Res<VisualizerRes>,
    mut text_query: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = text_query.get_single_mut() else {
        return;
    };
    let bridge = &visualizer.0;
    let Some(player) = bridge.player() else {
        return;
    };

    // Dead-reckoned position when the ship is drawn, snapshot otherwise
    let position = bridge
        .kinematics()
        .rendered_position(bridge.context())
        .map(|p| p * bridge.config().distance_factor)
        .unwrap_or(player.position);

    let content = hud_text(player, calculate_dist(position, player.body.position));
    if text.0 != content {
        text.0 = content;
    }
}

fn hud_text(player: &PlayerKinematicState, distance_km: f64) -> String {
    let mut lines = vec![
        player.username.clone(),
        format!("Status: {}", player.status),
        format!("{}: {}", if player.is_traveling() { "Destination" } else { "Landed on" }, player.body.name),
    ];
    if player.is_traveling() {
        lines.push(format_distance(distance_km));
    }
    if let Some(landing) = player.landing_time {
        lines.push(format!("Landing at {}", landing.format("%H:%M:%S UTC")));
    }
    if let Some(notification) = &player.notification {
        lines.push(notification.clone());
    }
    lines.join("\n")
}
