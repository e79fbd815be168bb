//! Startup: camera, HUD and render-surface attachment.

use bevy::core_pipeline::fxaa::Fxaa;
use bevy::prelude::*;
use bevy::render::camera::PerspectiveProjection;
use bevy::ui::PositionType;
use bevy::window::PrimaryWindow;

use crate::viewer::components::{HudPanel, HudText};
use crate::viewer::constants::{HUD_BACKGROUND, HUD_TEXT_COLOR, HUD_TITLE_COLOR};
use crate::viewer::resources::{SurfaceHost, VisualizerRes};

/// Spawn the camera and the HUD panel.
pub fn setup_scene(mut commands: Commands, visualizer: Res<VisualizerRes>) {
    let camera = &visualizer.0.context().camera;

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians() as f32,
            near: camera.near as f32,
            far: camera.far as f32,
            aspect_ratio: camera.aspect as f32,
        }),
        Transform::from_translation(camera.position.as_vec3())
            .looking_at(camera.look_at.as_vec3(), camera.up.as_vec3()),
        Msaa::Off,
        Fxaa::default(),
    ));

    commands
        .spawn((
            bevy::ui::Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                width: Val::Px(300.0),
                padding: UiRect::all(Val::Px(12.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(4.0),
                ..default()
            },
            BackgroundColor(HUD_BACKGROUND),
            BorderRadius::all(Val::Px(8.0)),
            HudPanel,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("orbitview"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(HUD_TITLE_COLOR),
            ));
            parent.spawn((
                Text::new("Waiting for game data..."),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(HUD_TEXT_COLOR),
                HudText,
            ));
        });
}

/// Attach the render surface to the window and start the frame loop.
pub fn attach_surface(
    mut visualizer: ResMut<VisualizerRes>,
    mut host: ResMut<SurfaceHost>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if let Ok(window) = windows.get_single() {
        visualizer
            .0
            .on_resize(window.width().round() as u32, window.height().round() as u32);
    }
    if visualizer.0.attach(host.as_mut()) {
        let passes = visualizer.0.context().composer.passes();
        tracing::info!(?passes, "Render surface attached");
    }
}
