//! Domain models consumed by the visualizer.
//!
//! Wire records (`*Record`) mirror the game server's JSON; the domain types
//! are what the rest of the crate works with.

mod body;
mod distance;
mod player;

pub use body::{BodyCatalog, BodyId, BodyKind, CelestialBody, OrbitParent, PlanetRecord};
pub use distance::{calculate_dist, format_distance};
pub use player::{Group, GroupRecord, Item, PlayerKinematicState, UserRecord, UserStatus};
