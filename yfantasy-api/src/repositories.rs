use crate::endpoints::{
    LeagueKey, TeamKey,
    games::GetGame,
    leagues::{GetLeague, GetScoreboard, GetStandings, ListTransactions},
    teams::{GetMatchups, GetRoster, GetTeam},
};
use crate::error::FantasyApiError;

#[derive(Default)]
pub struct GameRepository;

impl GameRepository {
    pub fn new() -> Self {
        Self
    }

    /// Current season of a game code such as `nfl`
    pub fn get(&self, game: impl Into<String>) -> GetGame {
        GetGame::new(game)
    }
}

pub struct LeagueRepository {
    league_key: LeagueKey,
}

impl LeagueRepository {
    pub fn new(league_key: LeagueKey) -> Self {
        Self { league_key }
    }

    pub fn get(&self) -> GetLeague {
        GetLeague::new(self.league_key.clone())
    }

    pub fn standings(&self) -> GetStandings {
        GetStandings::new(self.league_key.clone())
    }

    pub fn scoreboard(&self) -> GetScoreboard {
        GetScoreboard::new(self.league_key.clone())
    }

    pub fn transactions(&self) -> ListTransactions {
        ListTransactions::new(self.league_key.clone())
    }

    pub fn trades(&self) -> ListTransactions {
        self.transactions().transaction_type("trade")
    }

    pub fn team(&self, number: u32) -> TeamRepository {
        TeamRepository::new(self.league_key.team(number))
    }
}

pub struct TeamRepository {
    team_key: TeamKey,
}

impl TeamRepository {
    pub fn new(team_key: TeamKey) -> Self {
        Self { team_key }
    }

    pub fn get(&self) -> GetTeam {
        GetTeam::new(self.team_key.clone())
    }

    pub fn roster(&self) -> GetRoster {
        GetRoster::new(self.team_key.clone())
    }

    pub fn matchups(&self, weeks: &[u32], end_week: u32) -> Result<GetMatchups, FantasyApiError> {
        GetMatchups::new(self.team_key.clone(), weeks, end_week)
    }
}

#[cfg(test)]
mod tests {
    use crate::Request;
    use crate::endpoints::Endpoint;

    #[test]
    fn league_repository_builds_paths() {
        let league = Request::league("423.l.7");
        assert_eq!(league.get().path(), "league/423.l.7");
        assert_eq!(league.standings().path(), "league/423.l.7/standings");
        assert_eq!(league.trades().path(), "league/423.l.7/transactions;type=trade");
        assert_eq!(
            league.team(3).roster().path(),
            "team/423.l.7.t.3/roster/players"
        );
    }

    #[test]
    fn game_repository_builds_path() {
        assert_eq!(Request::games().get("nfl").path(), "game/nfl");
    }
}
