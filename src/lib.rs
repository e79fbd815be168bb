//! orbitview - space-travel game client
//!
//! A persistent 3D view of a shared solar system: celestial bodies with
//! distance-based level of detail, the player's ship dead-reckoned between
//! server snapshots, choreographed camera moves and presence pings for
//! every visible user.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod models;
pub mod viewer;
pub mod visualizer;
