// Player lookup capability injected into stat processing.

use thiserror::Error;

use crate::player::{LeagueId, Player, PlayerId};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to look up player `{name}`: {message}")]
    Lookup { name: String, message: String },

    #[error("failed to create player `{name}`: {message}")]
    Create { name: String, message: String },
}

/// Resolves a display name to a league player, creating a bare player the
/// first time a name is seen. Persistence supplies the real implementation;
/// the engine never talks to storage directly.
pub trait PlayerRepository {
    fn find_or_create_player(
        &mut self,
        league_id: LeagueId,
        name: &str,
    ) -> Result<Player, RepositoryError>;
}

/// Vec-backed repository for tests and offline computation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlayers {
    players: Vec<Player>,
    next_id: PlayerId,
    created: Vec<PlayerId>,
}

impl InMemoryPlayers {
    pub fn new() -> Self {
        InMemoryPlayers {
            players: Vec::new(),
            next_id: 1,
            created: Vec::new(),
        }
    }

    /// Seed with existing players. New ids continue after the highest seeded id.
    pub fn with_players(players: Vec<Player>) -> Self {
        let next_id = players.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        InMemoryPlayers {
            players,
            next_id,
            created: Vec::new(),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn find(&self, league_id: LeagueId, name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.league_id == league_id && p.name == name)
    }

    /// Ids of players materialised by `find_or_create_player`, in creation order.
    pub fn created(&self) -> &[PlayerId] {
        &self.created
    }

    pub fn into_players(self) -> Vec<Player> {
        self.players
    }
}

impl PlayerRepository for InMemoryPlayers {
    fn find_or_create_player(
        &mut self,
        league_id: LeagueId,
        name: &str,
    ) -> Result<Player, RepositoryError> {
        if let Some(existing) = self.find(league_id, name) {
            return Ok(existing.clone());
        }

        let player = Player::bare(self.next_id, league_id, name);
        self.next_id += 1;
        self.created.push(player.id);
        self.players.push(player.clone());
        Ok(player)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
