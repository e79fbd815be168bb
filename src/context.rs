//! Application context shared by every command.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{FixtureApi, GameApi, HttpGameClient, Identity, StaticIdentity};
use crate::config::Config;
use crate::error::Result;

/// Root application context.
///
/// Holds the configuration and the game server capabilities. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// The signed-in user.
    pub identity: Arc<dyn Identity>,
    /// The game server, or a directory of recorded responses.
    pub api: Arc<dyn GameApi>,
}

impl Context {
    /// Creates a context talking to the configured game server, or to the
    /// fixture files in `fixtures` when given.
    pub fn new(config: Config, fixtures: Option<PathBuf>) -> Result<Self> {
        let identity: Arc<dyn Identity> = Arc::new(StaticIdentity::from_config(&config.auth));

        let api: Arc<dyn GameApi> = match fixtures {
            Some(dir) => {
                tracing::info!("Using fixture responses from {}", dir.display());
                Arc::new(FixtureApi::new(dir))
            }
            None => {
                tracing::debug!("Using game server at {}", config.server.url);
                Arc::new(HttpGameClient::new(&config.server, identity.clone())?)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            identity,
            api,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[test]
    fn test_identity_comes_from_auth_section() {
        let config = Config {
            auth: AuthConfig {
                uid: Some("pilot-42".to_string()),
                token: Some("secret".to_string()),
            },
            ..Default::default()
        };

        let ctx = Context::new(config, None).unwrap();

        assert_eq!(ctx.identity.uid().as_deref(), Some("pilot-42"));
        assert_eq!(ctx.identity.bearer_token().unwrap(), "secret");
    }

    #[tokio::test]
    async fn test_fixture_directory_replaces_the_server() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(Config::default(), Some(dir.path().to_path_buf())).unwrap();

        // Nothing recorded yet, so the read fails instead of hitting the network
        assert!(ctx.api.fetch_player_state().await.is_err());
        assert!(ctx.identity.uid().is_none());
    }
}
