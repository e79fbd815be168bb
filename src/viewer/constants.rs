//! Rendering and input constants for the viewer window.

use bevy::prelude::*;

// =============================================================================
// Window
// =============================================================================

pub const WINDOW_TITLE: &str = "orbitview";
pub const WINDOW_SIZE: (f32, f32) = (1280.0, 720.0);
pub const CLEAR_COLOR: Color = Color::BLACK;

// =============================================================================
// Meshes
// =============================================================================

pub const SPHERE_SECTORS: u32 = 32;
pub const SPHERE_STACKS: u32 = 16;
pub const SKY_SECTORS: u32 = 25;
/// Outline hull size relative to the outlined body.
pub const OUTLINE_HULL_SCALE: f32 = 1.02;

// =============================================================================
// Lighting
// =============================================================================

/// Lumens per unit of scene point-light intensity.
pub const POINT_LIGHT_LUMENS: f32 = 1.0e9;
pub const POINT_LIGHT_RANGE: f32 = 1.0e5;
pub const AMBIENT_BRIGHTNESS: f32 = 400.0;

// =============================================================================
// Input
// =============================================================================

pub const DOUBLE_CLICK_SECS: f64 = 0.3;
/// Radians of orbit per pixel dragged.
pub const ORBIT_SENSITIVITY: f64 = 0.01;
/// Dolly factor per scroll line.
pub const ZOOM_STEP: f64 = 0.9;
/// Pixels per scroll line for touchpads.
pub const PIXELS_PER_LINE: f32 = 100.0;

// =============================================================================
// HUD
// =============================================================================

pub const HUD_BACKGROUND: Color = Color::srgba(0.1, 0.1, 0.15, 0.85);
pub const HUD_TITLE_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);
pub const HUD_TEXT_COLOR: Color = Color::srgb(0.7, 0.7, 0.7);
