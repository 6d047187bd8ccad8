pub mod games;
pub mod leagues;
pub mod teams;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Display;

/// A GET-able resource under the fantasy API base URL
pub trait Endpoint {
    fn kind(&self) -> ResourceKind;

    /// Path relative to the base URL, including `;name=value` modifiers
    fn path(&self) -> Cow<'_, str>;

    /// Elements to descend through below `fantasy_content` before picking
    /// the element named by [`ResourceKind::tag`]
    fn nest(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Resource kinds this client knows how to address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Game,
    League,
    Team,
    Roster,
    Standings,
    Scoreboard,
    Matchups,
    Transactions,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Game,
        ResourceKind::League,
        ResourceKind::Team,
        ResourceKind::Roster,
        ResourceKind::Standings,
        ResourceKind::Scoreboard,
        ResourceKind::Matchups,
        ResourceKind::Transactions,
    ];

    /// Element name of this resource in a response document
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::League => "league",
            Self::Team => "team",
            Self::Roster => "roster",
            Self::Standings => "standings",
            Self::Scoreboard => "scoreboard",
            Self::Matchups => "matchups",
            Self::Transactions => "transactions",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Kind addressed by the first segment of a raw path, ignoring modifiers
    pub fn from_path(path: &str) -> Option<Self> {
        let first = path.trim_start_matches('/').split('/').next()?;
        Self::from_tag(first.split(';').next()?)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// `<game_id>.l.<league_id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueKey(String);

impl LeagueKey {
    pub fn new(game_id: impl Display, league_id: u64) -> Self {
        Self(format!("{}.l.{}", game_id, league_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the `number`-th team in this league (1-based)
    pub fn team(&self, number: u32) -> TeamKey {
        TeamKey(format!("{}.t.{}", self.0, number))
    }
}

impl Display for LeagueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeagueKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LeagueKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// `<league_key>.t.<team_number>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamKey(String);

impl TeamKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TeamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TeamKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
