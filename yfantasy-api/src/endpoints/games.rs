use super::{Endpoint, ResourceKind};
use std::borrow::Cow;

/// `game/<code>`, e.g. `game/nfl` for the current NFL season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetGame {
    game: String,
}

impl GetGame {
    pub fn new(game: impl Into<String>) -> Self {
        Self { game: game.into() }
    }
}

impl Endpoint for GetGame {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Game
    }

    fn path(&self) -> Cow<'_, str> {
        format!("game/{}", self.game).into()
    }
}
