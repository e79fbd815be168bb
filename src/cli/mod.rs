//! CLI module for orbitview.
//!
//! Subcommands:
//! - `view`: Open the 3D solar system view
//! - `status`: Print the player's current state
//! - `travel`, `teleport`: Head for a celestial body
//! - `boost`: Use the speed boost
//! - `join`: Join a group

mod command;
mod status;
mod view;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::context::Context;

/// orbitview - space-travel game client
#[derive(Parser)]
#[command(name = "orbitview")]
#[command(about = "Space-travel game client with a persistent 3D solar system view")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read game state from JSON files in this directory instead of the server
    #[arg(long, global = true, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the 3D solar system view
    View,

    /// Print the player's current state
    Status,

    /// Travel to a celestial body (name or id)
    Travel { destination: String },

    /// Use the speed boost
    Boost,

    /// Teleport to a celestial body (name or id)
    Teleport { destination: String },

    /// Join a group by name
    Join { group: String },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::View => self.run_view().await,
            Command::Status => self.run_status().await,
            Command::Travel { ref destination } => self.run_travel(destination).await,
            Command::Boost => self.run_boost().await,
            Command::Teleport { ref destination } => self.run_teleport(destination).await,
            Command::Join { ref group } => self.run_join(group).await,
        }
    }

    /// Load configuration and build the shared context.
    fn context(&self) -> color_eyre::Result<Context> {
        let config = Config::load()?;
        Ok(Context::new(config, self.fixtures.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_travel_with_fixtures() {
        let app = App::parse_from(["orbitview", "--fixtures", "demo", "travel", "Mars"]);

        assert_eq!(app.fixtures, Some(PathBuf::from("demo")));
        assert!(matches!(app.command, Command::Travel { ref destination } if destination == "Mars"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let app = App::parse_from(["orbitview", "view", "-v"]);

        assert!(app.verbose);
        assert!(matches!(app.command, Command::View));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        App::command().debug_assert();
    }
}
