//! Player kinematic state as reported by the game server.

use std::collections::HashSet;

use bevy::math::DVec3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::body::{CelestialBody, PlanetRecord};

/// Milliseconds per hour; velocities are in km/h.
const MS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

/// Travel status. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UserStatus {
    Traveling,
    Landed,
}

impl TryFrom<u8> for UserStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Traveling),
            1 => Ok(Self::Landed),
            other => Err(format!("unknown user status {other}")),
        }
    }
}

impl From<UserStatus> for u8 {
    fn from(status: UserStatus) -> Self {
        match status {
            UserStatus::Traveling => 0,
            UserStatus::Landed => 1,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Traveling => f.write_str("TRAVELING"),
            Self::Landed => f.write_str("LANDED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub rarity: String,
}

/// A user as sent by the game server's login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub status: UserStatus,
    pub username: String,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub base_speed: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    #[serde(default)]
    pub velocity_x: f64,
    #[serde(default)]
    pub velocity_y: f64,
    #[serde(default)]
    pub velocity_z: f64,
    #[serde(default)]
    pub color: Option<String>,
    pub server_time: DateTime<Utc>,
    #[serde(default)]
    pub next_boost: Option<DateTime<Utc>>,
    #[serde(default)]
    pub landing_time: Option<DateTime<Utc>>,
    pub planet: PlanetRecord,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub notification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// A group the player belongs to; members are visible to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub members: Vec<PlayerKinematicState>,
}

/// One authoritative, timestamped snapshot of a player.
///
/// Position and velocity are only exact at `server_time`. Replaced wholesale
/// on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerKinematicState {
    pub username: String,
    pub status: UserStatus,
    /// Position in kilometres.
    pub position: DVec3,
    /// Velocity in km/h.
    pub velocity: DVec3,
    /// Current body: the destination while traveling, the surface when landed.
    pub body: CelestialBody,
    /// CSS color identifying the user.
    pub color: String,
    pub server_time: DateTime<Utc>,
    pub landing_time: Option<DateTime<Utc>>,
    pub next_boost: Option<DateTime<Utc>>,
    pub speed: f64,
    pub groups: Vec<Group>,
    pub items: Vec<Item>,
    pub notification: Option<String>,
}

impl From<UserRecord> for PlayerKinematicState {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            status: record.status,
            position: DVec3::new(record.position_x, record.position_y, record.position_z),
            velocity: DVec3::new(record.velocity_x, record.velocity_y, record.velocity_z),
            body: record.planet.into(),
            color: record.color.unwrap_or_else(|| "#ffffff".to_string()),
            server_time: record.server_time,
            landing_time: record.landing_time,
            next_boost: record.next_boost,
            speed: record.speed,
            groups: record
                .groups
                .into_iter()
                .map(|group| Group {
                    name: group.name,
                    members: group.users.into_iter().map(Self::from).collect(),
                })
                .collect(),
            items: record.items,
            notification: record.notification,
        }
    }
}

impl PlayerKinematicState {
    pub fn is_traveling(&self) -> bool {
        self.status == UserStatus::Traveling
    }

    /// Position in render units.
    pub fn scaled_position(&self, distance_factor: f64) -> DVec3 {
        self.position / distance_factor
    }

    /// Dead-reckoned position (km) at `at`: `position + velocity * (at - server_time)`.
    pub fn extrapolate(&self, at: DateTime<Utc>) -> DVec3 {
        let elapsed_ms = (at - self.server_time).num_milliseconds() as f64;
        self.position + self.velocity * (elapsed_ms / MS_PER_HOUR)
    }

    /// The player plus every group member, deduplicated by username.
    ///
    /// The player comes first and keeps its own snapshot when it also appears
    /// in a group.
    pub fn visible_users(&self) -> Vec<&PlayerKinematicState> {
        let mut seen = HashSet::new();
        std::iter::once(self)
            .chain(self.groups.iter().flat_map(|g| g.members.iter()))
            .filter(|user| seen.insert(user.username.as_str()))
            .collect()
    }

    /// Time from the snapshot until landing, if a landing is scheduled.
    pub fn until_landing(&self) -> Option<chrono::Duration> {
        self.landing_time.map(|t| t - self.server_time)
    }

    /// Time from the snapshot until the next boost becomes available.
    pub fn until_next_boost(&self) -> Option<chrono::Duration> {
        self.next_boost.map(|t| t - self.server_time)
    }

    /// Shortest positive server timer; state must be refreshed when it hits zero.
    pub fn next_timer(&self) -> Option<std::time::Duration> {
        [self.until_landing(), self.until_next_boost()]
            .into_iter()
            .flatten()
            .filter_map(|d| d.to_std().ok())
            .filter(|d| !d.is_zero())
            .min()
    }
}
