use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;
use yfantasy_api::Request;

use super::{entries, text, JobContext};

/// Announces league trades it has not seen before.
///
/// The first run only records the trades that already exist, so a restart
/// does not replay the season's history.
#[derive(Default)]
pub struct TradeWatch {
    seen: Mutex<Option<HashSet<String>>>,
}

impl TradeWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of trades delivered
    pub async fn run(&self, ctx: &JobContext) -> Result<usize> {
        let snapshot = ctx.league.get().context("League snapshot not loaded yet")?;
        let league_key = snapshot
            .league_key()
            .context("League snapshot has no league_key")?
            .to_string();

        let resource = ctx
            .client
            .fetch(&Request::league(league_key).trades())
            .await
            .context("Failed to fetch trades")?;

        let trades: Vec<(String, &Value)> = entries(&resource.document()["transaction"])
            .into_iter()
            .filter_map(|t| Some((text(&t["transaction_key"])?.to_string(), t)))
            .collect();

        let unseen: Vec<(String, String)> = {
            let mut seen = self
                .seen
                .lock()
                .map_err(|_| anyhow::anyhow!("Trade watch state poisoned"))?;

            match seen.as_mut() {
                None => {
                    tracing::info!(trades = trades.len(), "Recorded existing trades");
                    *seen = Some(trades.into_iter().map(|(key, _)| key).collect());
                    return Ok(0);
                }
                Some(seen) => trades
                    .iter()
                    .filter(|(key, _)| !seen.contains(key))
                    .map(|(key, trade)| (key.clone(), describe_trade(trade)))
                    .collect(),
            }
        };

        for (key, line) in &unseen {
            ctx.channel
                .deliver(&ctx.settings.channels.trades, line)
                .await
                .with_context(|| format!("Failed to announce trade {}", key))?;

            if let Ok(mut seen) = self.seen.lock() {
                if let Some(seen) = seen.as_mut() {
                    seen.insert(key.clone());
                }
            }
        }

        Ok(unseen.len())
    }
}

/// One line per trade: status, both teams, and the players moved
pub fn describe_trade(trade: &Value) -> String {
    let status = text(&trade["status"]).unwrap_or("proposed");
    let trader = text(&trade["trader_team_name"])
        .or_else(|| text(&trade["trader_team_key"]))
        .unwrap_or("?");
    let tradee = text(&trade["tradee_team_name"])
        .or_else(|| text(&trade["tradee_team_key"]))
        .unwrap_or("?");

    let players: Vec<&str> = entries(&trade["players"]["player"])
        .into_iter()
        .filter_map(|p| text(&p["name"]["full"]))
        .collect();

    if players.is_empty() {
        format!("Trade {}: {} and {}", status, trader, tradee)
    } else {
        format!(
            "Trade {}: {} and {} ({})",
            status,
            trader,
            tradee,
            players.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_trade_lists_players() {
        let trade = json!({
            "transaction_key": "423.l.7.tr.3",
            "status": "accepted",
            "trader_team_name": "Alpha",
            "tradee_team_name": "Bravo",
            "players": {"@count": "2", "player": [
                {"name": {"full": "Player One"}},
                {"name": {"full": "Player Two"}}
            ]}
        });
        assert_eq!(
            describe_trade(&trade),
            "Trade accepted: Alpha and Bravo (Player One, Player Two)"
        );
    }

    #[test]
    fn test_describe_trade_falls_back_to_keys() {
        let trade = json!({"trader_team_key": "423.l.7.t.1", "tradee_team_key": "423.l.7.t.2"});
        assert_eq!(
            describe_trade(&trade),
            "Trade proposed: 423.l.7.t.1 and 423.l.7.t.2"
        );
    }
}
