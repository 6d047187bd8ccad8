//! The bot's scheduled jobs and their wiring into the supervisor.

mod channel;
mod league_sync;
mod trade_watch;
mod week_in_review;

pub use channel::{Channel, LogChannel};
pub use league_sync::sync_league;
pub use trade_watch::{describe_trade, TradeWatch};
pub use week_in_review::{summarize_week, week_in_review};

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use yfantasy_api::Client;

pub(crate) use crate::league::text;
use crate::league::{SharedLeague, SnapshotCache};
use crate::scheduler::{CronSchedule, RecurringTask, TaskSupervisor};
use crate::settings::Settings;

/// Everything a job needs, cheap to clone into each tick
#[derive(Clone)]
pub struct JobContext {
    pub client: Arc<Client>,
    pub league: SharedLeague,
    pub cache: SnapshotCache,
    pub channel: Arc<dyn Channel>,
    pub settings: Arc<Settings>,
}

/// A repeated XML element converts to an array, a single one to an object
/// and an absent one to null. Flatten all three to a list.
pub(crate) fn entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn schedule(name: &str, expression: &str) -> Result<CronSchedule> {
    CronSchedule::parse(expression).with_context(|| format!("Invalid schedule for {}", name))
}

/// Register league sync, trade watch and week in review with `supervisor`
pub fn register_jobs(supervisor: &mut TaskSupervisor, ctx: &JobContext) -> Result<()> {
    let schedules = &ctx.settings.schedules;

    let sync_ctx = ctx.clone();
    supervisor.register(RecurringTask::new(
        "league_sync",
        schedule("league_sync", &schedules.league_sync)?,
        move || {
            let ctx = sync_ctx.clone();
            async move { sync_league(&ctx).await.map(|_| ()) }
        },
    ));

    let trade_ctx = ctx.clone();
    let trades = Arc::new(TradeWatch::new());
    supervisor.register(RecurringTask::new(
        "trade_watch",
        schedule("trade_watch", &schedules.trade_watch)?,
        move || {
            let ctx = trade_ctx.clone();
            let trades = trades.clone();
            async move {
                let delivered = trades.run(&ctx).await?;
                if delivered > 0 {
                    tracing::info!(delivered, "Announced new trades");
                }
                Ok(())
            }
        },
    ));

    let review_ctx = ctx.clone();
    let league = ctx.league.clone();
    supervisor.register(
        RecurringTask::new(
            "week_in_review",
            schedule("week_in_review", &schedules.week_in_review)?,
            move || {
                let ctx = review_ctx.clone();
                async move { week_in_review(&ctx).await }
            },
        )
        .with_guard(move || league.season_open(chrono::Utc::now().date_naive())),
    );

    Ok(())
}
