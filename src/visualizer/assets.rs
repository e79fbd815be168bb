//! Asynchronous asset requests and the texture naming table.
//!
//! The core never blocks on I/O. It queues [`LoadRequest`]s; the host
//! performs the loads and reports each [`LoadOutcome`] back.

use std::collections::HashMap;

use bevy::color::palettes::css;
use bevy::color::Srgba;
use bevy::math::{DQuat, DVec3};
use serde::Deserialize;

use super::scene::{Material, MeshPart, PartShape};
use crate::error::{AppError, Result};
use crate::models::{BodyId, BodyKind, CelestialBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    BodyTexture(BodyId),
    SkyTexture,
    ShipModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub id: LoadId,
    pub target: LoadTarget,
    /// Path relative to the asset root.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Texture,
    Model(ShipModel),
    Failed(String),
}

/// Requests not yet handed to the host, and those in flight.
#[derive(Debug, Default)]
pub struct AssetQueue {
    next_id: u64,
    queued: Vec<LoadRequest>,
    in_flight: HashMap<LoadId, LoadRequest>,
}

impl AssetQueue {
    pub fn request(&mut self, target: LoadTarget, path: impl Into<String>) -> LoadId {
        self.next_id += 1;
        let id = LoadId(self.next_id);
        let path = path.into();
        tracing::debug!(?target, %path, "Queued asset load");
        self.queued.push(LoadRequest { id, target, path });
        id
    }

    /// Hand queued requests to the host.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        let requests = std::mem::take(&mut self.queued);
        for request in &requests {
            self.in_flight.insert(request.id, request.clone());
        }
        requests
    }

    /// Match a completion to its request. `None` for unknown or stale ids.
    pub fn resolve(&mut self, id: LoadId) -> Option<LoadRequest> {
        self.in_flight.remove(&id).or_else(|| {
            let idx = self.queued.iter().position(|r| r.id == id)?;
            Some(self.queued.remove(idx))
        })
    }

    pub fn clear(&mut self) {
        self.queued.clear();
        self.in_flight.clear();
    }
}

/// Texture path for a body: by name first, then by kind.
pub fn texture_for_body(body: &CelestialBody) -> &'static str {
    match body.name.as_str() {
        "The Sun" => "models/sun.jpg",
        "Mercury" => "models/mercury.jpg",
        "Venus" => "models/venus.jpg",
        "Earth" => "models/earth.jpg",
        "Mars" => "models/mars.jpg",
        "Jupiter" => "models/jupiter.jpg",
        "Io" => "models/io.jpg",
        "Europa" => "models/europa.jpg",
        "Ganymede" => "models/ganymede.jpg",
        "Callisto" => "models/callisto.jpg",
        "Saturn" => "models/saturn.jpg",
        "Titan" => "models/titan.jpg",
        "Iapetus" => "models/iapetus.jpg",
        "Uranus" => "models/uranus.jpg",
        "Neptune" => "models/neptune.jpg",
        "Triton" => "models/triton.png",
        "Pluto" => "models/pluto.jpg",
        "The Moon" => "models/moon.jpg",
        _ => match body.kind {
            BodyKind::Star => "models/sun.jpg",
            BodyKind::Moon | BodyKind::Planet => "models/moon.jpg",
        },
    }
}

/// Parse a CSS color: a common color name, or hex as `#rgb`, `#rrggbb` or
/// without the hash.
pub fn parse_color(value: &str) -> Result<Srgba> {
    let value = value.trim();
    if let Some(color) = named_color(&value.to_ascii_lowercase()) {
        return Ok(color);
    }
    Srgba::hex(value).map_err(|_| AppError::InvalidColor(value.to_string()))
}

fn named_color(name: &str) -> Option<Srgba> {
    let color = match name {
        "black" => css::BLACK,
        "white" => css::WHITE,
        "red" => css::RED,
        "green" => css::GREEN,
        "blue" => css::BLUE,
        "yellow" => css::YELLOW,
        "aqua" | "cyan" => css::AQUA,
        "fuchsia" | "magenta" => css::FUCHSIA,
        "orange" => css::ORANGE,
        "purple" => css::PURPLE,
        "pink" => css::PINK,
        "gray" | "grey" => css::GRAY,
        "silver" => css::SILVER,
        "lime" => css::LIME,
        "navy" => css::NAVY,
        "teal" => css::TEAL,
        "maroon" => css::MAROON,
        "olive" => css::OLIVE,
        "gold" => css::GOLD,
        "tomato" => css::TOMATO,
        "violet" => css::VIOLET,
        "indigo" => css::INDIGO,
        "brown" => css::BROWN,
        "coral" => css::CORAL,
        "crimson" => css::CRIMSON,
        "salmon" => css::SALMON,
        "turquoise" => css::TURQUOISE,
        "orchid" => css::ORCHID,
        _ => return None,
    };
    Some(color)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PartRecord {
    name: String,
    #[serde(flatten)]
    shape: PartShape,
    #[serde(default)]
    offset: [f64; 3],
    /// Rotation about X in degrees.
    #[serde(default)]
    tilt: f64,
    #[serde(default = "default_part_color")]
    color: String,
}

fn default_part_color() -> String {
    "#ffffff".to_string()
}

/// The ship: a small composite of primitive meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipModel {
    pub parts: Vec<MeshPart>,
}

#[derive(Debug, Deserialize)]
struct ShipModelFile {
    parts: Vec<PartRecord>,
}

impl ShipModel {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ShipModelFile = serde_json::from_str(json)?;
        let parts = file
            .parts
            .into_iter()
            .map(|part| {
                Ok(MeshPart {
                    material: Material {
                        lit: true,
                        ..Material::unlit(parse_color(&part.color)?)
                    },
                    name: part.name,
                    shape: part.shape,
                    offset: DVec3::from_array(part.offset),
                    rotation: DQuat::from_rotation_x(part.tilt.to_radians()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parts })
    }
}
