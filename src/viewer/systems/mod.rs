//! ECS systems for the viewer.
//!
//! Systems are functions that operate on components and resources each frame.

pub mod assets;
pub mod camera;
pub mod frame;
pub mod hud;
pub mod input;
pub mod sync;

pub use assets::{poll_loads_system, start_loads_system};
pub use camera::camera_sync_system;
pub use frame::{drain_feed_system, frame_system, resize_system, teardown_system};
pub use hud::update_hud_system;
pub use input::camera_input_system;
pub use sync::sync_scene_system;
