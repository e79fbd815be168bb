//! Engine-agnostic core of the 3D solar-system view.
//!
//! The [`StateBridge`] owns one [`RenderContext`] and the components that
//! act on it:
//!
//! - [`registry`]: one placeholder per body, upgraded to a textured sphere
//!   when the camera gets close
//! - [`choreographer`]: eased camera transitions, at most one at a time
//! - [`kinematics`]: dead reckoning of the player's ship between snapshots
//! - [`presence`]: repeating ping rings for every visible user
//!
//! Time is injected through a [`Scheduler`] so frames and timers can be
//! driven deterministically. The Bevy front-end in `crate::viewer` mirrors
//! the resulting scene graph into entities.

pub mod assets;
pub mod bridge;
pub mod choreographer;
pub mod geometry;
pub mod kinematics;
pub mod presence;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod tween;

pub use assets::{LoadId, LoadOutcome, LoadRequest, LoadTarget, ShipModel};
pub use bridge::StateBridge;
pub use choreographer::{CameraChoreographer, CameraView};
pub use registry::{BodyEntry, BodyRegistry, TextureState};
pub use scene::{
    Blending, Container, ElementId, Material, MeshPart, NodeId, PartShape, RenderContext,
    SceneGraph, SceneNode, Shape,
};
pub use scheduler::{Scheduler, SchedulerStats};
