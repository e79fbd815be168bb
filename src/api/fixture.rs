//! File-backed game API.
//!
//! Reads `catalog.json` (a list of planet records) and `player.json` (a user
//! record) from a directory on every fetch, so editing the files changes
//! what the viewer shows on the next poll. Commands are recorded, not sent.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use super::GameApi;
use crate::error::{AppError, Result};
use crate::models::{BodyCatalog, BodyId, PlanetRecord, PlayerKinematicState, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedCommand {
    Travel(BodyId),
    Boost,
    Teleport(BodyId),
    JoinGroup(String),
}

pub struct FixtureApi {
    dir: PathBuf,
    commands: Mutex<Vec<IssuedCommand>>,
}

impl FixtureApi {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Commands issued so far, oldest first.
    pub fn commands(&self) -> Vec<IssuedCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: IssuedCommand) -> Result<()> {
        tracing::info!(?command, "Fixture command recorded");
        self.commands
            .lock()
            .map_err(|_| AppError::Feed("fixture command log poisoned".to_string()))?
            .push(command);
        Ok(())
    }

    async fn read(&self, file: &str) -> Result<String> {
        Ok(tokio::fs::read_to_string(self.dir.join(file)).await?)
    }
}

#[async_trait]
impl GameApi for FixtureApi {
    async fn fetch_player_state(&self) -> Result<PlayerKinematicState> {
        let record: UserRecord = serde_json::from_str(&self.read("player.json").await?)?;
        Ok(record.into())
    }

    async fn fetch_planet_catalog(&self) -> Result<BodyCatalog> {
        let records: Vec<PlanetRecord> = serde_json::from_str(&self.read("catalog.json").await?)?;
        Ok(BodyCatalog::from_records(records))
    }

    async fn travel(&self, destination: BodyId) -> Result<()> {
        self.record(IssuedCommand::Travel(destination))
    }

    async fn boost(&self) -> Result<()> {
        self.record(IssuedCommand::Boost)
    }

    async fn teleport(&self, destination: BodyId) -> Result<()> {
        self.record(IssuedCommand::Teleport(destination))
    }

    async fn join_group(&self, group: &str) -> Result<()> {
        self.record(IssuedCommand::JoinGroup(group.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": 1, "name": "The Sun", "type": "star", "positionX": 0, "positionY": 0, "positionZ": 0, "radius": 696340},
        {"id": 3, "name": "Earth", "positionX": 1.5e8, "positionY": 0, "positionZ": 0, "radius": 6371,
         "orbiting": {"id": 1, "name": "The Sun", "positionX": 0, "positionY": 0, "positionZ": 0}}
    ]"#;

    const PLAYER: &str = r#"{
        "status": 1, "username": "ada",
        "positionX": 1.5e8, "positionY": 0, "positionZ": 0,
        "serverTime": "2024-03-01T12:00:00Z",
        "planet": {"id": 3, "name": "Earth", "positionX": 1.5e8, "positionY": 0, "positionZ": 0}
    }"#;

    #[tokio::test]
    async fn test_reads_fixture_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
        std::fs::write(dir.path().join("player.json"), PLAYER).unwrap();
        let api = FixtureApi::new(dir.path());

        let catalog = api.fetch_planet_catalog().await.unwrap();
        let player = api.fetch_player_state().await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(player.body.id, BodyId(3));
        assert!(!player.is_traveling());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = FixtureApi::new(dir.path());

        assert!(matches!(api.fetch_player_state().await, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_commands_are_recorded() {
        let api = FixtureApi::new("unused");
        api.travel(BodyId(4)).await.unwrap();
        api.boost().await.unwrap();
        api.join_group("crew").await.unwrap();

        assert_eq!(
            api.commands(),
            vec![
                IssuedCommand::Travel(BodyId(4)),
                IssuedCommand::Boost,
                IssuedCommand::JoinGroup("crew".to_string()),
            ]
        );
    }
}
