//! Feeding external events to the core and driving its frame callback.

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::feed::FeedEvent;
use crate::viewer::resources::{FeedRes, VisualizerRes};

/// Apply every snapshot that arrived since the last frame.
///
/// Runs before [`frame_system`] so a snapshot never lands mid-frame.
pub fn drain_feed_system(feed: Res<FeedRes>, mut visualizer: ResMut<VisualizerRes>) {
    let Ok(mut events) = feed.events.lock() else {
        return;
    };
    while let Ok(event) = events.try_recv() {
        match event {
            FeedEvent::Catalog(catalog) => visualizer.0.on_catalog_loaded(catalog),
            FeedEvent::Player(state) => visualizer.0.on_player_state_changed(state),
        }
    }
}

pub fn resize_system(mut resized: EventReader<WindowResized>, mut visualizer: ResMut<VisualizerRes>) {
    for event in resized.read() {
        visualizer
            .0
            .on_resize(event.width.round() as u32, event.height.round() as u32);
    }
}

/// The display-refresh callback.
///
/// Driven by real time so long frames are not clamped.
pub fn frame_system(time: Res<Time<Real>>, mut visualizer: ResMut<VisualizerRes>) {
    visualizer.0.on_animation_frame(frame_timestamp_ms(&time));
}

fn frame_timestamp_ms(time: &Time<Real>) -> f64 {
    time.elapsed_secs_f64() * 1000.0
}

pub fn teardown_system(mut exit: EventReader<AppExit>, mut visualizer: ResMut<VisualizerRes>) {
    if exit.read().next().is_some() {
        visualizer.0.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_frame_timestamp_keeps_long_stalls() {
        let start = Instant::now();
        let mut time = Time::<Real>::new(start);
        time.update_with_instant(start);
        time.update_with_instant(start + Duration::from_secs(1));

        assert_eq!(frame_timestamp_ms(&time), 1000.0);
    }
}
