use super::{Endpoint, ResourceKind, TeamKey};
use crate::error::FantasyApiError;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTeam {
    team_key: TeamKey,
}

impl GetTeam {
    pub fn new(team_key: TeamKey) -> Self {
        Self { team_key }
    }
}

impl Endpoint for GetTeam {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Team
    }

    fn path(&self) -> Cow<'_, str> {
        format!("team/{}", self.team_key).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRoster {
    team_key: TeamKey,
}

impl GetRoster {
    pub fn new(team_key: TeamKey) -> Self {
        Self { team_key }
    }
}

impl Endpoint for GetRoster {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Roster
    }

    fn path(&self) -> Cow<'_, str> {
        format!("team/{}/roster/players", self.team_key).into()
    }

    fn nest(&self) -> &'static [&'static str] {
        &["team"]
    }
}

/// Matchups for the given weeks; every week of the season when empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMatchups {
    team_key: TeamKey,
    weeks: Vec<u32>,
}

impl GetMatchups {
    /// Weeks must fall within `1..=end_week` of the league's season
    pub fn new(team_key: TeamKey, weeks: &[u32], end_week: u32) -> Result<Self, FantasyApiError> {
        if let Some(week) = weeks.iter().find(|w| !(1..=end_week).contains(*w)) {
            return Err(FantasyApiError::ResourceUnavailable(format!(
                "Matchup weeks must be between 1 and {}! ({})",
                end_week, week
            )));
        }

        Ok(Self {
            team_key,
            weeks: weeks.to_vec(),
        })
    }
}

impl Endpoint for GetMatchups {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Matchups
    }

    fn path(&self) -> Cow<'_, str> {
        if self.weeks.is_empty() {
            return format!("team/{}/matchups", self.team_key).into();
        }
        let weeks = self
            .weeks
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("team/{}/matchups;weeks={}", self.team_key, weeks).into()
    }

    fn nest(&self) -> &'static [&'static str] {
        &["team"]
    }
}
