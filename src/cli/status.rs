//! Status command handler.

use std::fmt::Write;

use chrono::Utc;
use color_eyre::Result;

use crate::models::{calculate_dist, format_distance, PlayerKinematicState};

use super::App;

impl App {
    /// Print the signed-in player's current state.
    pub async fn run_status(&self) -> Result<()> {
        let ctx = self.context()?;
        let player = ctx.api.fetch_player_state().await?;
        print!("{}", describe_player(&player, Utc::now()));
        Ok(())
    }
}

/// Multi-line summary of a snapshot, with the position extrapolated to `now`.
pub(crate) fn describe_player(player: &PlayerKinematicState, now: chrono::DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", player.username, player.status);

    if player.is_traveling() {
        let position = player.extrapolate(now);
        let _ = writeln!(
            out,
            "Destination: {} ({})",
            player.body.name,
            format_distance(calculate_dist(position, player.body.position))
        );
        if let Some(landing) = player.landing_time {
            let _ = writeln!(out, "Landing at {} UTC", landing.format("%Y-%m-%d %H:%M:%S"));
        }
    } else {
        let _ = writeln!(out, "Landed on: {}", player.body.name);
    }

    match player.next_boost {
        Some(boost) if boost > now => {
            let _ = writeln!(out, "Next boost at {} UTC", boost.format("%H:%M:%S"));
        }
        _ => {
            let _ = writeln!(out, "Boost ready");
        }
    }

    for group in &player.groups {
        let members: Vec<&str> = group.members.iter().map(|m| m.username.as_str()).collect();
        let _ = writeln!(out, "Group {}: {}", group.name, members.join(", "));
    }
    if let Some(notification) = &player.notification {
        let _ = writeln!(out, "! {notification}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    fn player(status: u8) -> PlayerKinematicState {
        let json = format!(
            r##"{{
                "status": {status},
                "username": "ada",
                "positionX": 0, "positionY": 0, "positionZ": 0,
                "velocityX": 3600000, "velocityY": 0, "velocityZ": 0,
                "serverTime": "2024-03-01T12:00:00Z",
                "landingTime": "2024-03-01T12:10:00Z",
                "nextBoost": "2024-03-01T11:00:00Z",
                "planet": {{"id": 4, "name": "Mars", "positionX": 5000000, "positionY": 0, "positionZ": 0}},
                "groups": [{{"name": "crew", "users": []}}],
                "notification": "Welcome aboard"
            }}"##
        );
        serde_json::from_str::<UserRecord>(&json).unwrap().into()
    }

    #[test]
    fn test_traveling_summary_uses_extrapolated_distance() {
        let player = player(0);
        let now = player.server_time + chrono::Duration::minutes(30);

        let text = describe_player(&player, now);

        // 3.6e6 km/h for half an hour leaves 3.2e6 km to go
        assert!(text.contains("ada [TRAVELING]"));
        assert!(text.contains("Destination: Mars (3.2 million km away)"));
        assert!(text.contains("Landing at 2024-03-01 12:10:00 UTC"));
        assert!(text.contains("Boost ready"));
        assert!(text.contains("Group crew: "));
        assert!(text.contains("! Welcome aboard"));
    }

    #[test]
    fn test_landed_summary() {
        let player = player(1);

        let text = describe_player(&player, player.server_time);

        assert!(text.contains("Landed on: Mars"));
        assert!(!text.contains("Destination"));
    }
}
