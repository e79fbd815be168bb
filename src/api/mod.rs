//! Capabilities the visualizer consumes from outside collaborators.
//!
//! - [`Identity`] - Who is signed in and how to authenticate requests
//! - [`GameApi`] - Player state, the planet catalog and game commands
//!
//! Two implementations ship with the crate:
//!
//! - [`HttpGameClient`] - talks to the game server over HTTP
//! - [`FixtureApi`] - serves JSON files from a directory, for offline use
//!   and tests

mod fixture;
mod http;

use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::{BodyCatalog, BodyId, PlayerKinematicState};

pub use fixture::{FixtureApi, IssuedCommand};
pub use http::HttpGameClient;

/// The signed-in user.
pub trait Identity: Send + Sync {
    /// Stable identity of the current user, if anyone is signed in.
    fn uid(&self) -> Option<String>;

    /// Bearer token for authenticated requests.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] when there is no current user.
    fn bearer_token(&self) -> Result<String>;

    /// Forget the current credentials.
    fn sign_out(&self);
}

/// Credentials taken from the `[auth]` config section.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    credentials: std::sync::RwLock<Option<(String, String)>>,
}

impl StaticIdentity {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            credentials: std::sync::RwLock::new(Some((uid.into(), token.into()))),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        match (&auth.uid, &auth.token) {
            (Some(uid), Some(token)) => Self::new(uid.clone(), token.clone()),
            _ => Self::default(),
        }
    }
}

impl Identity for StaticIdentity {
    fn uid(&self) -> Option<String> {
        self.credentials
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(|(uid, _)| uid.clone()))
    }

    fn bearer_token(&self) -> Result<String> {
        self.credentials
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(|(_, token)| token.clone()))
            .ok_or(AppError::NotSignedIn)
    }

    fn sign_out(&self) {
        if let Ok(mut credentials) = self.credentials.write() {
            *credentials = None;
        }
    }
}

/// The game server.
///
/// Commands are fire-and-refresh: a successful command changes server-side
/// state, and the caller is expected to invalidate its player snapshot.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Fetches the signed-in player's current snapshot.
    async fn fetch_player_state(&self) -> Result<PlayerKinematicState>;

    /// Fetches every celestial body. Effectively immutable for a session.
    async fn fetch_planet_catalog(&self) -> Result<BodyCatalog>;

    /// Starts traveling toward `destination`.
    async fn travel(&self, destination: BodyId) -> Result<()>;

    /// Uses the speed boost.
    async fn boost(&self) -> Result<()>;

    /// Moves the player to `destination` instantly. Privileged.
    async fn teleport(&self, destination: BodyId) -> Result<()>;

    /// Joins the group with the given invite id.
    async fn join_group(&self, group: &str) -> Result<()>;
}
