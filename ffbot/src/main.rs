use anyhow::{Context, Result};
use std::sync::Arc;

use ffbot::jobs::{register_jobs, sync_league, JobContext, LogChannel};
use ffbot::league::{SharedLeague, SnapshotCache};
use ffbot::logging::init_logging;
use ffbot::scheduler::TaskSupervisor;
use ffbot::team_directory::TeamDirectory;
use ffbot::Settings;
use yfantasy_api::Client;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let (log_path, _log_guard) = init_logging(&settings.log_dir)?;
    tracing::info!(path = %log_path.display(), "Logging initialized");

    let tokens = Arc::new(ffbot_auth::authenticate(&settings.auth).await?);
    let client = Arc::new(Client::new(&settings.api.base_url, tokens)?);

    let cache = SnapshotCache::new(&settings.league.snapshot_path);
    let league = SharedLeague::default();
    match cache.load().await {
        Ok(Some(snapshot)) => {
            tracing::info!(league_key = ?snapshot.league_key(), "Loaded league snapshot");
            league.replace(snapshot);
        }
        Ok(None) => tracing::info!("No league snapshot on disk"),
        Err(e) => tracing::warn!("Ignoring unreadable league snapshot: {}", e),
    }

    let directory = TeamDirectory::new(&settings.team_map_path);
    match directory.all() {
        Ok(map) => tracing::info!(mappings = map.len(), "Team directory loaded"),
        Err(e) => tracing::warn!("Team directory unavailable: {:#}", e),
    }

    let ctx = JobContext {
        client,
        league,
        cache,
        channel: Arc::new(LogChannel),
        settings: Arc::new(settings),
    };

    if ctx.league.get().is_none() {
        if let Err(e) = sync_league(&ctx).await {
            tracing::warn!("Initial league sync failed: {:#}", e);
        }
    }

    let mut supervisor = TaskSupervisor::new();
    register_jobs(&mut supervisor, &ctx)?;
    supervisor.start();
    tracing::info!(tasks = ?supervisor.task_names(), "Scheduler started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    supervisor.shutdown().await;
    Ok(())
}
