use super::{Endpoint, LeagueKey, ResourceKind};
use crate::macros::modifier;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLeague {
    league_key: LeagueKey,
}

impl GetLeague {
    pub fn new(league_key: LeagueKey) -> Self {
        Self { league_key }
    }
}

impl Endpoint for GetLeague {
    fn kind(&self) -> ResourceKind {
        ResourceKind::League
    }

    fn path(&self) -> Cow<'_, str> {
        format!("league/{}", self.league_key).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStandings {
    league_key: LeagueKey,
}

impl GetStandings {
    pub fn new(league_key: LeagueKey) -> Self {
        Self { league_key }
    }
}

impl Endpoint for GetStandings {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Standings
    }

    fn path(&self) -> Cow<'_, str> {
        format!("league/{}/standings", self.league_key).into()
    }

    fn nest(&self) -> &'static [&'static str] {
        &["league"]
    }
}

/// Scoreboard for one week; the current week when none is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetScoreboard {
    league_key: LeagueKey,
    week: Option<u32>,
}

impl GetScoreboard {
    pub fn new(league_key: LeagueKey) -> Self {
        Self {
            league_key,
            week: None,
        }
    }

    modifier!(week: u32);
}

impl Endpoint for GetScoreboard {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Scoreboard
    }

    fn path(&self) -> Cow<'_, str> {
        match self.week {
            Some(week) => format!("league/{}/scoreboard;week={}", self.league_key, week).into(),
            None => format!("league/{}/scoreboard", self.league_key).into(),
        }
    }

    fn nest(&self) -> &'static [&'static str] {
        &["league"]
    }
}

/// League transactions, optionally filtered by type (`add`, `drop`, `trade`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTransactions {
    league_key: LeagueKey,
    transaction_type: Option<String>,
}

impl ListTransactions {
    pub fn new(league_key: LeagueKey) -> Self {
        Self {
            league_key,
            transaction_type: None,
        }
    }

    modifier!(transaction_type: String);
}

impl Endpoint for ListTransactions {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Transactions
    }

    fn path(&self) -> Cow<'_, str> {
        match &self.transaction_type {
            Some(kind) => format!("league/{}/transactions;type={}", self.league_key, kind).into(),
            None => format!("league/{}/transactions", self.league_key).into(),
        }
    }

    fn nest(&self) -> &'static [&'static str] {
        &["league"]
    }
}
