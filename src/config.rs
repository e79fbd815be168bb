//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/orbitview/config.toml` (XDG) or platform config dir
//! 2. Project config: `.orbitview.toml`
//! 3. Environment variables: `ORBITVIEW_*` (nested keys split on `__`)
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/orbitview/config.toml`):
//! ```toml
//! [server]
//! url = "https://game.example.com"
//!
//! [auth]
//! uid = "pilot-42"
//! token = "eyJhbGciOi..."
//! ```
//!
//! **Project config** (`.orbitview.toml`), usually only for tuning:
//! ```toml
//! [visualizer]
//! follow_duration_ms = 4000
//! lod_threshold = 2.5
//! ```
//!
//! Every key has a default, so running without any config file is valid.
//! The visualizer constants are empirically tuned values, not physical law.

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

/// Game server connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the game server (no trailing slash needed).
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Static credentials backing the identity capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity of the signed-in user.
    pub uid: Option<String>,
    /// Bearer token sent with every request.
    pub token: Option<String>,
}

/// Player state polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Seconds between player state polls.
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5 * 60,
        }
    }
}

/// Tuning constants for the 3D visualizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Kilometres per render unit.
    pub distance_factor: f64,
    /// K in `distance / radius / K`.
    pub lod_distance_divisor: f64,
    /// Distance factor below which the textured body is loaded.
    pub lod_threshold: f64,
    /// Exponent of the placeholder / orbit line opacity falloff.
    pub lod_falloff_exponent: i32,
    /// Placeholder radius (render units) for bodies without a radius.
    pub default_body_radius: f64,
    /// Rotation added to textured bodies every frame (radians).
    pub body_rotation_step: f64,
    pub follow_duration_ms: f64,
    pub overhead_duration_ms: f64,
    pub view_shift_duration_ms: f64,
    /// Camera z used by the overhead view.
    pub overhead_height: f64,
    /// Follow camera distance while traveling (render units).
    pub traveling_follow_distance: f64,
    /// Landed follow distance is `body radius km / landed_follow_divisor`.
    pub landed_follow_divisor: f64,
    /// Body radius assumed when the current body has none (km).
    pub fallback_body_radius_km: f64,
    pub ping_interval_ms: f64,
    /// Upper bound of the random offset added to each user's ping interval.
    pub ping_jitter_ms: f64,
    pub ping_duration_ms: f64,
    pub ping_start_radius: f64,
    pub ping_end_radius: f64,
    /// Camera distance is divided by this to size a ping.
    pub ping_distance_divisor: f64,
    /// Pings closer than this (after division) stay opaque for their whole life.
    pub ping_min_distance: f64,
    pub auto_rotate_speed: f64,
    pub damping_factor: f64,
    pub ship_scale: f64,
    pub sky_radius: f64,
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Directory textures and models are loaded from.
    pub asset_root: String,
    pub ship_model: String,
    pub sky_texture: String,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            distance_factor: 10_000_000.0,
            lod_distance_divisor: 500.0,
            lod_threshold: 2.0,
            lod_falloff_exponent: 3,
            default_body_radius: 0.005,
            body_rotation_step: 0.0002,
            follow_duration_ms: 5000.0,
            overhead_duration_ms: 5000.0,
            view_shift_duration_ms: 3000.0,
            overhead_height: 1000.0,
            traveling_follow_distance: 0.01,
            landed_follow_divisor: 500_000.0,
            fallback_body_radius_km: 5000.0,
            ping_interval_ms: 1000.0,
            ping_jitter_ms: 100.0,
            ping_duration_ms: 1000.0,
            ping_start_radius: 1.0,
            ping_end_radius: 10.0,
            ping_distance_divisor: 750.0,
            ping_min_distance: 0.001,
            auto_rotate_speed: 0.1,
            damping_factor: 0.25,
            ship_scale: 0.0005,
            sky_radius: 2_000_000.0,
            fov_degrees: 50.0,
            near: 0.0001,
            far: 50_000.0,
            asset_root: "assets".to_string(),
            ship_model: "models/rocket.json".to_string(),
            sky_texture: "models/space.jpg".to_string(),
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Self::user_config_path(), ".orbitview.toml".into())
            .extract()
            .map_err(ConfigError::from)
    }

    fn figment(user_config: std::path::PathBuf, project_config: std::path::PathBuf) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("ORBITVIEW_").split("__"))
    }

    /// User config path: ~/.config/orbitview/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("orbitview").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("orbitview").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = Config::figment(
            dir.path().join("missing-user.toml"),
            dir.path().join("missing-project.toml"),
        )
        .extract()
        .unwrap();

        assert_eq!(config.feed.poll_interval_secs, 300);
        assert_eq!(config.visualizer.lod_distance_divisor, 500.0);
        assert_eq!(config.visualizer.lod_falloff_exponent, 3);
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn test_project_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join("project.toml");
        std::fs::write(
            &user,
            "[server]\nurl = \"https://user.example\"\n[visualizer]\nlod_threshold = 3.0\n",
        )
        .unwrap();
        std::fs::write(&project, "[visualizer]\nlod_threshold = 2.5\n").unwrap();

        let config: Config = Config::figment(user, project).extract().unwrap();

        assert_eq!(config.server.url, "https://user.example");
        assert_eq!(config.visualizer.lod_threshold, 2.5);
        // Untouched keys keep their defaults
        assert_eq!(config.visualizer.follow_duration_ms, 5000.0);
    }
}
