//! Celestial bodies and the planet catalog.

use std::collections::{HashMap, HashSet};

use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

/// Server-assigned identity of a celestial body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub i64);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Type tag governing which texture and material a body uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Star,
    #[default]
    Planet,
    Moon,
}

/// A planet as sent by the game server.
///
/// The parent body is embedded as a full record under `orbiting`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetRecord {
    pub id: i64,
    pub name: String,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: BodyKind,
    #[serde(default)]
    pub orbiting: Option<Box<PlanetRecord>>,
}

/// The body another body orbits.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitParent {
    pub id: BodyId,
    pub name: String,
    /// Position in kilometres.
    pub position: DVec3,
}

/// A celestial body. Immutable for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub id: BodyId,
    pub name: String,
    pub kind: BodyKind,
    /// Position in kilometres.
    pub position: DVec3,
    /// Physical radius in kilometres, if known.
    pub radius: Option<f64>,
    pub orbiting: Option<OrbitParent>,
}

impl From<PlanetRecord> for CelestialBody {
    fn from(record: PlanetRecord) -> Self {
        Self {
            id: BodyId(record.id),
            name: record.name,
            kind: record.kind,
            position: DVec3::new(record.position_x, record.position_y, record.position_z),
            radius: record.radius,
            orbiting: record.orbiting.map(|parent| OrbitParent {
                id: BodyId(parent.id),
                name: parent.name,
                position: DVec3::new(parent.position_x, parent.position_y, parent.position_z),
            }),
        }
    }
}

impl CelestialBody {
    /// Position in render units.
    pub fn scaled_position(&self, distance_factor: f64) -> DVec3 {
        self.position / distance_factor
    }

    /// Radius in render units, or `default` when the body has no usable radius.
    pub fn scaled_radius(&self, distance_factor: f64, default: f64) -> f64 {
        match self.radius {
            Some(radius) if radius > 0.0 => radius / distance_factor,
            _ => default,
        }
    }
}

/// The planet catalog, indexed by body identity.
#[derive(Debug, Clone, Default)]
pub struct BodyCatalog {
    bodies: Vec<CelestialBody>,
    index: HashMap<BodyId, usize>,
}

impl BodyCatalog {
    /// Build a catalog. Duplicate identities keep the first occurrence.
    pub fn new(bodies: impl IntoIterator<Item = CelestialBody>) -> Self {
        let mut catalog = Self::default();
        for body in bodies {
            if catalog.index.contains_key(&body.id) {
                tracing::warn!(id = %body.id, name = %body.name, "Duplicate body in catalog, ignoring");
                continue;
            }
            catalog.index.insert(body.id, catalog.bodies.len());
            catalog.bodies.push(body);
        }
        catalog
    }

    pub fn from_records(records: Vec<PlanetRecord>) -> Self {
        Self::new(records.into_iter().map(CelestialBody::from))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.iter()
    }

    pub fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.index.get(&id).map(|&idx| &self.bodies[idx])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Parent chain of a body, nearest first.
    ///
    /// Returns `None` when the chain loops back on itself.
    pub fn ancestors(&self, id: BodyId) -> Option<Vec<BodyId>> {
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = self.get(id)?.orbiting.as_ref().map(|p| p.id);

        while let Some(parent) = current {
            if !seen.insert(parent) {
                return None;
            }
            chain.push(parent);
            current = self
                .get(parent)
                .and_then(|body| body.orbiting.as_ref())
                .map(|p| p.id);
        }
        Some(chain)
    }

    /// Centre of the body's orbit curve in kilometres.
    ///
    /// `None` for root bodies and for bodies whose parent chain is cyclic;
    /// those get no orbit line. The catalog's copy of the parent wins over
    /// the embedded record.
    pub fn orbit_center(&self, id: BodyId) -> Option<DVec3> {
        let body = self.get(id)?;
        let parent = body.orbiting.as_ref()?;
        if self.ancestors(id).is_none() {
            tracing::warn!(id = %id, name = %body.name, "Cyclic orbit chain, skipping orbit line");
            return None;
        }
        Some(
            self.get(parent.id)
                .map(|p| p.position)
                .unwrap_or(parent.position),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, x: f64, orbiting: Option<PlanetRecord>) -> PlanetRecord {
        PlanetRecord {
            id,
            name: name.to_string(),
            position_x: x,
            position_y: 0.0,
            position_z: 0.0,
            radius: Some(1000.0),
            kind: BodyKind::Planet,
            orbiting: orbiting.map(Box::new),
        }
    }

    #[test]
    fn test_planet_record_deserialization() {
        let json = r#"{
            "id": 3,
            "name": "Earth",
            "positionX": 1.5e8,
            "positionY": 0,
            "positionZ": 0,
            "radius": 6371,
            "type": "planet",
            "orbiting": {
                "id": 1, "name": "The Sun", "type": "star",
                "positionX": 0, "positionY": 0, "positionZ": 0, "radius": 696340
            }
        }"#;
        let body: CelestialBody = serde_json::from_str::<PlanetRecord>(json).unwrap().into();

        assert_eq!(body.id, BodyId(3));
        assert_eq!(body.kind, BodyKind::Planet);
        assert_eq!(body.orbiting.as_ref().unwrap().name, "The Sun");
        assert_eq!(body.scaled_position(1e7), DVec3::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_scaled_radius_falls_back_for_missing_or_zero() {
        let mut body: CelestialBody = record(1, "Rock", 0.0, None).into();
        assert_eq!(body.scaled_radius(1e3, 0.005), 1.0);

        body.radius = Some(0.0);
        assert_eq!(body.scaled_radius(1e3, 0.005), 0.005);

        body.radius = None;
        assert_eq!(body.scaled_radius(1e3, 0.005), 0.005);
    }

    #[test]
    fn test_catalog_orbit_center_uses_catalog_parent() {
        let sun = record(1, "The Sun", 0.0, None);
        let mut stale_sun = sun.clone();
        stale_sun.position_x = 42.0;
        let earth = record(3, "Earth", 100.0, Some(stale_sun));

        let catalog = BodyCatalog::from_records(vec![sun, earth]);

        assert_eq!(catalog.orbit_center(BodyId(1)), None);
        assert_eq!(catalog.orbit_center(BodyId(3)), Some(DVec3::ZERO));
        assert_eq!(catalog.ancestors(BodyId(3)), Some(vec![BodyId(1)]));
    }

    #[test]
    fn test_catalog_detects_cycles() {
        let a = record(1, "A", 0.0, Some(record(2, "B", 10.0, None)));
        let b = record(2, "B", 10.0, Some(record(1, "A", 0.0, None)));

        let catalog = BodyCatalog::from_records(vec![a, b]);

        assert_eq!(catalog.ancestors(BodyId(1)), None);
        assert_eq!(catalog.orbit_center(BodyId(1)), None);
    }

    #[test]
    fn test_catalog_ignores_duplicates() {
        let catalog = BodyCatalog::from_records(vec![
            record(1, "First", 0.0, None),
            record(1, "Second", 5.0, None),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(BodyId(1)).unwrap().name, "First");
    }
}
