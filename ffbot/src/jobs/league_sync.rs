use anyhow::{bail, Context, Result};
use yfantasy_api::{endpoints::LeagueKey, Request};

use super::JobContext;
use crate::league::LeagueSnapshot;

/// Largest league the API hosts
const MAX_TEAMS: u32 = 32;

/// Fetch the current game, the league and each of its teams, then replace
/// both the snapshot file and the shared in-memory copy.
pub async fn sync_league(ctx: &JobContext) -> Result<LeagueSnapshot> {
    let settings = &ctx.settings.league;

    let game = ctx
        .client
        .fetch(&Request::games().get(settings.game.as_str()))
        .await
        .with_context(|| format!("Failed to fetch game '{}'", settings.game))?;
    let game_key = game
        .str_field("game_key")
        .or_else(|| game.str_field("game_id"))
        .context("Game response has no game_key")?;

    let league_key = LeagueKey::new(&game_key, settings.id);
    let league_repo = Request::league(league_key.clone());
    let league = ctx
        .client
        .fetch(&league_repo.get())
        .await
        .with_context(|| format!("Failed to fetch league {}", league_key))?;
    let num_teams: u32 = league
        .str_field("num_teams")
        .and_then(|n| n.parse().ok())
        .context("League response has no num_teams")?;
    if !(1..=MAX_TEAMS).contains(&num_teams) {
        bail!("League {} reports {} teams, expected 1 to {}", league_key, num_teams, MAX_TEAMS);
    }

    let mut teams = Vec::new();
    for number in 1..=num_teams {
        let team = ctx
            .client
            .fetch(&league_repo.team(number).get())
            .await
            .with_context(|| format!("Failed to fetch team {} of {}", number, league_key))?;
        teams.push(team.into_document());
    }

    let snapshot = LeagueSnapshot::new(game.into_document(), league.into_document(), teams);
    ctx.cache
        .store(&snapshot)
        .await
        .context("Failed to write league snapshot")?;
    ctx.league.replace(snapshot.clone());

    tracing::info!(league_key = %league_key, teams = num_teams, "League snapshot refreshed");
    Ok(snapshot)
}
