//! Game command handlers.
//!
//! Commands are fire-and-refresh: send the command, then fetch and print
//! the player's new state.

use color_eyre::Result;

use crate::context::Context;
use crate::error::AppError;
use crate::models::{BodyCatalog, BodyId};

use super::status::describe_player;
use super::App;

impl App {
    pub async fn run_travel(&self, destination: &str) -> Result<()> {
        let ctx = self.context()?;
        let catalog = ctx.api.fetch_planet_catalog().await?;
        let id = resolve_body(&catalog, destination)?;
        tracing::info!(%id, "Travelling to {}", destination);
        ctx.api.travel(id).await?;
        refresh(&ctx).await
    }

    pub async fn run_boost(&self) -> Result<()> {
        let ctx = self.context()?;
        ctx.api.boost().await?;
        refresh(&ctx).await
    }

    pub async fn run_teleport(&self, destination: &str) -> Result<()> {
        let ctx = self.context()?;
        let catalog = ctx.api.fetch_planet_catalog().await?;
        let id = resolve_body(&catalog, destination)?;
        tracing::info!(%id, "Teleporting to {}", destination);
        ctx.api.teleport(id).await?;
        refresh(&ctx).await
    }

    pub async fn run_join(&self, group: &str) -> Result<()> {
        let ctx = self.context()?;
        ctx.api.join_group(group).await?;
        refresh(&ctx).await
    }
}

async fn refresh(ctx: &Context) -> Result<()> {
    let player = ctx.api.fetch_player_state().await?;
    print!("{}", describe_player(&player, chrono::Utc::now()));
    Ok(())
}

/// Look a body up by id, then by exact name, then by case-insensitive name.
fn resolve_body(catalog: &BodyCatalog, query: &str) -> Result<BodyId, AppError> {
    if let Ok(raw) = query.parse::<i64>() {
        if let Some(body) = catalog.get(BodyId(raw)) {
            return Ok(body.id);
        }
    }
    catalog
        .find_by_name(query)
        .or_else(|| catalog.iter().find(|b| b.name.eq_ignore_ascii_case(query)))
        .map(|body| body.id)
        .ok_or_else(|| AppError::BodyNotFound(query.to_string()))
}
