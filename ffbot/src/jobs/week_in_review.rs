use anyhow::{Context, Result};
use serde_json::Value;
use yfantasy_api::Request;

use super::{entries, text, JobContext};

/// Teams scoring under this in a week get a mention
const POOR_SHOWING_POINTS: f64 = 60.0;

struct TeamScore<'a> {
    name: &'a str,
    points: f64,
    display: &'a str,
}

/// Post last week's summary to the general channel
pub async fn week_in_review(ctx: &JobContext) -> Result<()> {
    let snapshot = ctx.league.get().context("League snapshot not loaded yet")?;
    let league_key = snapshot
        .league_key()
        .context("League snapshot has no league_key")?
        .to_string();
    let week = snapshot.current_week().unwrap_or(1).saturating_sub(1).max(1);

    let scoreboard = ctx
        .client
        .fetch(&Request::league(league_key).scoreboard().week(week))
        .await
        .with_context(|| format!("Failed to fetch scoreboard for week {}", week))?;

    let summary = summarize_week(scoreboard.document())
        .with_context(|| format!("Scoreboard for week {} has no scored matchups", week))?;

    ctx.channel
        .deliver(&ctx.settings.channels.general, &summary)
        .await
}

/// Best and worst scores of the week plus other poor showings.
/// `None` when the scoreboard holds no scored teams.
pub fn summarize_week(scoreboard: &Value) -> Option<String> {
    let matchups = entries(&scoreboard["matchups"]["matchup"]);
    let first = matchups.first()?;

    let mut scores: Vec<TeamScore<'_>> = matchups
        .iter()
        .flat_map(|m| entries(&m["teams"]["team"]))
        .filter_map(|team| {
            let display = text(&team["team_points"]["total"])?;
            Some(TeamScore {
                name: text(&team["name"]).unwrap_or("?"),
                points: display.parse().ok()?,
                display,
            })
        })
        .collect();
    scores.sort_by(|a, b| a.points.total_cmp(&b.points));

    let worst = scores.first()?;
    let best = scores.last()?;

    let mut out = format!(
        "Week in Review: Week {}",
        text(&first["week"]).or_else(|| text(&scoreboard["week"])).unwrap_or("?")
    );
    if let (Some(start), Some(end)) = (text(&first["week_start"]), text(&first["week_end"])) {
        out.push_str(&format!(" ({} to {})", start, end));
    }
    out.push('\n');
    out.push_str(&format!("Best week: {} ... {}\n", best.name, best.display));
    out.push_str(&format!("Worst week: {} ... {}\n", worst.name, worst.display));

    let poor: Vec<&TeamScore<'_>> = scores
        .iter()
        .skip(1)
        .take_while(|s| s.points < POOR_SHOWING_POINTS)
        .collect();
    if !poor.is_empty() {
        out.push_str("Also deserving a shoutout for poor showings:\n");
        for team in poor {
            out.push_str(&format!("  {} ... {}\n", team.name, team.display));
        }
    }

    Some(out.trim_end().to_string())
}
