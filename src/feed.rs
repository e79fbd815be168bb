//! Background state feed.
//!
//! Fetches the planet catalog once and the player snapshot on a fixed
//! interval, on explicit invalidation, and whenever one of the player's
//! server timers (landing, next boost) runs out. Results are pushed over an
//! unbounded channel that the viewer drains between frames.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::api::GameApi;
use crate::config::FeedConfig;
use crate::models::{BodyCatalog, PlayerKinematicState};

const CATALOG_RETRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Catalog(BodyCatalog),
    Player(PlayerKinematicState),
}

/// Cloneable handle for forcing a refresh.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    invalidate: Arc<Notify>,
}

impl FeedHandle {
    /// Re-fetch the player snapshot now, e.g. after a travel command.
    pub fn invalidate(&self) {
        self.invalidate.notify_one();
    }
}

pub struct StateFeed {
    api: Arc<dyn GameApi>,
    poll_interval: Duration,
    invalidate: Arc<Notify>,
    tx: UnboundedSender<FeedEvent>,
}

/// Create a feed with its control handle and event receiver.
pub fn channel(
    api: Arc<dyn GameApi>,
    config: &FeedConfig,
) -> (StateFeed, FeedHandle, UnboundedReceiver<FeedEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let invalidate = Arc::new(Notify::new());
    let feed = StateFeed {
        api,
        poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
        invalidate: invalidate.clone(),
        tx,
    };
    (feed, FeedHandle { invalidate }, rx)
}

impl StateFeed {
    /// Run until the receiver is dropped. Fetch errors are logged and
    /// retried on the next wake-up; they never end the feed.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        let mut catalog_loaded = false;
        let mut next_timer: Option<Duration> = None;

        loop {
            if !catalog_loaded {
                match self.api.fetch_planet_catalog().await {
                    Ok(catalog) => {
                        tracing::info!(bodies = catalog.len(), "Fetched planet catalog");
                        catalog_loaded = true;
                        if self.tx.send(FeedEvent::Catalog(catalog)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to fetch planet catalog"),
                }
            }

            match self.api.fetch_player_state().await {
                Ok(state) => {
                    tracing::debug!(user = %state.username, status = %state.status, "Fetched player state");
                    next_timer = state.next_timer();
                    if self.tx.send(FeedEvent::Player(state)).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to fetch player state"),
            }

            let server_timer = async {
                match next_timer {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => std::future::pending().await,
                }
            };
            let catalog_retry = async {
                if catalog_loaded {
                    std::future::pending().await
                } else {
                    tokio::time::sleep(CATALOG_RETRY).await
                }
            };

            tokio::select! {
                _ = interval.tick() => {}
                _ = self.invalidate.notified() => {
                    tracing::debug!("Player state invalidated");
                }
                _ = server_timer => {
                    tracing::debug!("Server timer elapsed, refreshing");
                }
                _ = catalog_retry => {}
                _ = self.tx.closed() => break,
            }
        }
        tracing::debug!("State feed stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FixtureApi;

    const CATALOG: &str = r#"[
        {"id": 1, "name": "The Sun", "type": "star", "positionX": 0, "positionY": 0, "positionZ": 0}
    ]"#;

    const PLAYER: &str = r#"{
        "status": 1, "username": "ada",
        "positionX": 0, "positionY": 0, "positionZ": 0,
        "serverTime": "2024-03-01T12:00:00Z",
        "planet": {"id": 1, "name": "The Sun", "positionX": 0, "positionY": 0, "positionZ": 0}
    }"#;

    async fn next(rx: &mut UnboundedReceiver<FeedEvent>) -> FeedEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("feed timed out")
            .expect("feed closed")
    }

    #[tokio::test]
    async fn test_catalog_then_player_then_refresh_on_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
        std::fs::write(dir.path().join("player.json"), PLAYER).unwrap();

        let api = Arc::new(FixtureApi::new(dir.path()));
        let (feed, handle, mut rx) = channel(api, &FeedConfig::default());
        let task = tokio::spawn(feed.run());

        assert!(matches!(next(&mut rx).await, FeedEvent::Catalog(c) if c.len() == 1));
        assert!(matches!(next(&mut rx).await, FeedEvent::Player(p) if p.username == "ada"));

        handle.invalidate();
        assert!(matches!(next(&mut rx).await, FeedEvent::Player(_)));

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("feed did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_player_errors_do_not_stop_the_feed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();

        let api = Arc::new(FixtureApi::new(dir.path()));
        let (feed, handle, mut rx) = channel(api, &FeedConfig::default());
        tokio::spawn(feed.run());

        assert!(matches!(next(&mut rx).await, FeedEvent::Catalog(_)));

        std::fs::write(dir.path().join("player.json"), PLAYER).unwrap();
        handle.invalidate();
        assert!(matches!(next(&mut rx).await, FeedEvent::Player(_)));
    }
}
