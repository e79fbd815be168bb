//! HTTP client for the game server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::{GameApi, Identity};
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::models::{BodyCatalog, BodyId, PlanetRecord, PlayerKinematicState, UserRecord};

pub struct HttpGameClient {
    client: Client,
    base_url: String,
    identity: Arc<dyn Identity>,
}

impl HttpGameClient {
    pub fn new(config: &ServerConfig, identity: Arc<dyn Identity>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            identity,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post(&self, path: &str) -> Result<Response> {
        let token = self.identity.bearer_token()?;
        tracing::debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.identity.bearer_token()?;
        tracing::debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(AppError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GameApi for HttpGameClient {
    async fn fetch_player_state(&self) -> Result<PlayerKinematicState> {
        // The login endpoint doubles as "who am I"
        let body = self.post("login").await?.text().await?;
        let record: UserRecord = serde_json::from_str(&body)?;
        Ok(record.into())
    }

    async fn fetch_planet_catalog(&self) -> Result<BodyCatalog> {
        let records: Vec<PlanetRecord> = self.get_json("planets").await?;
        Ok(BodyCatalog::from_records(records))
    }

    async fn travel(&self, destination: BodyId) -> Result<()> {
        self.post(&format!("travelingTo/{destination}")).await?;
        Ok(())
    }

    async fn boost(&self) -> Result<()> {
        self.post("speedboost").await?;
        Ok(())
    }

    async fn teleport(&self, destination: BodyId) -> Result<()> {
        self.post(&format!("teleport/{destination}")).await?;
        Ok(())
    }

    async fn join_group(&self, group: &str) -> Result<()> {
        self.post(&format!("joinGroup/{group}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticIdentity;

    fn client(url: &str) -> HttpGameClient {
        let config = ServerConfig {
            url: url.to_string(),
            timeout_secs: 1,
        };
        HttpGameClient::new(&config, Arc::new(StaticIdentity::default())).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client("https://game.example/");
        assert_eq!(client.url("/login"), "https://game.example/login");
        assert_eq!(client.url("travelingTo/4"), "https://game.example/travelingTo/4");
    }

    #[tokio::test]
    async fn test_requests_require_sign_in() {
        let client = client("http://127.0.0.1:9");
        let err = client.boost().await.unwrap_err();
        assert!(matches!(err, AppError::NotSignedIn));
    }
}
