// Player and team identities as the engine sees them.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub type LeagueId = i64;
pub type PlayerId = i64;
pub type TeamId = i64;
pub type GameId = i64;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Roster designation recorded against a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a stored gender string. Anything unrecognised is treated as unset.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salary estimation bucket. Only `male` lands in the open bucket; female and
/// unset players share the women bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenderBucket {
    Open,
    Women,
}

impl GenderBucket {
    pub fn of(gender: Option<Gender>) -> Self {
        match gender {
            Some(Gender::Male) => GenderBucket::Open,
            _ => GenderBucket::Women,
        }
    }
}

// ---------------------------------------------------------------------------
// Player / Team
// ---------------------------------------------------------------------------

/// A player known to a league. Names are unique within a league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub league_id: LeagueId,
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Operator-entered salary used when no salary can be derived from stats.
    #[serde(default)]
    pub fallback_salary: Option<i64>,
    /// Standing team membership, if the player is formally rostered.
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl Player {
    /// A freshly materialised player: no team, no gender, no fallback.
    pub fn bare(id: PlayerId, league_id: LeagueId, name: impl Into<String>) -> Self {
        Player {
            id,
            league_id,
            name: name.into(),
            gender: None,
            fallback_salary: None,
            team_id: None,
        }
    }

    pub fn is_male(&self) -> bool {
        self.gender == Some(Gender::Male)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub league_id: LeagueId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
