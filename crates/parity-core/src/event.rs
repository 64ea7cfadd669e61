// Event model: games, points and the play-by-play events inside them.
//
// Field names follow the JSON the stat-keeping clients already send:
// `offensePlayers`, `firstActor`, `homeRoster` and friends are camelCase,
// everything else is snake_case. Snake-case aliases are accepted on input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::player::{GameId, LeagueId};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The kind of a single recorded play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Pull,
    Pass,
    Drop,
    Throwaway,
    Defense,
    Point,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pull => "PULL",
            EventType::Pass => "PASS",
            EventType::Drop => "DROP",
            EventType::Throwaway => "THROWAWAY",
            EventType::Defense => "DEFENSE",
            EventType::Point => "POINT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One play. `second_actor` is only meaningful for passes (the receiver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(rename = "firstActor", alias = "first_actor")]
    pub first_actor: String,
    #[serde(
        rename = "secondActor",
        alias = "second_actor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub second_actor: Option<String>,
    /// Client-side capture time, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Event {
    pub fn pull(by: &str) -> Self {
        Self::single(EventType::Pull, by)
    }

    pub fn pass(thrower: &str, receiver: &str) -> Self {
        Event {
            event_type: EventType::Pass,
            first_actor: thrower.to_string(),
            second_actor: Some(receiver.to_string()),
            timestamp: None,
        }
    }

    pub fn drop(by: &str) -> Self {
        Self::single(EventType::Drop, by)
    }

    pub fn throwaway(by: &str) -> Self {
        Self::single(EventType::Throwaway, by)
    }

    pub fn defense(by: &str) -> Self {
        Self::single(EventType::Defense, by)
    }

    pub fn point(by: &str) -> Self {
        Self::single(EventType::Point, by)
    }

    fn single(event_type: EventType, actor: &str) -> Self {
        Event {
            event_type,
            first_actor: actor.to_string(),
            second_actor: None,
            timestamp: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

/// One possession cycle: the two lines on the field and what happened.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "offensePlayers", alias = "offense_players", default)]
    pub offense_players: Vec<String>,
    #[serde(rename = "defensePlayers", alias = "defense_players", default)]
    pub defense_players: Vec<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Point {
    pub fn new(offense: &[&str], defense: &[&str], events: Vec<Event>) -> Self {
        Point {
            offense_players: offense.iter().map(|s| s.to_string()).collect(),
            defense_players: defense.iter().map(|s| s.to_string()).collect(),
            events,
        }
    }

    pub fn is_on_offense(&self, name: &str) -> bool {
        self.offense_players.iter().any(|p| p == name)
    }

    /// Names listed on both lines. A well-formed point has none.
    pub fn roster_overlap(&self) -> Vec<&str> {
        self.offense_players
            .iter()
            .filter(|p| self.defense_players.contains(p))
            .map(|p| p.as_str())
            .collect()
    }

    /// Number of goals recorded in this point.
    pub fn goal_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == EventType::Point)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

/// Upload payload for a newly recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedGame {
    pub league_id: LeagueId,
    pub week: u32,
    #[serde(rename = "homeTeam", alias = "home_team")]
    pub home_team: String,
    #[serde(rename = "awayTeam", alias = "away_team")]
    pub away_team: String,
    #[serde(rename = "homeRoster", alias = "home_roster", default)]
    pub home_roster: Vec<String>,
    #[serde(rename = "awayRoster", alias = "away_roster", default)]
    pub away_roster: Vec<String>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(rename = "homeScore", alias = "home_score")]
    pub home_score: u32,
    #[serde(rename = "awayScore", alias = "away_score")]
    pub away_score: u32,
}

/// Replacement content for an existing game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditedGame {
    pub week: u32,
    #[serde(rename = "homeRoster", alias = "home_roster", default)]
    pub home_roster: Vec<String>,
    #[serde(rename = "awayRoster", alias = "away_roster", default)]
    pub away_roster: Vec<String>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(rename = "homeScore", alias = "home_score")]
    pub home_score: u32,
    #[serde(rename = "awayScore", alias = "away_score")]
    pub away_score: u32,
}

/// A stored game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub league_id: LeagueId,
    pub week: u32,
    #[serde(rename = "homeTeam", alias = "home_team")]
    pub home_team: String,
    #[serde(rename = "awayTeam", alias = "away_team")]
    pub away_team: String,
    #[serde(rename = "homeRoster", alias = "home_roster", default)]
    pub home_roster: Vec<String>,
    #[serde(rename = "awayRoster", alias = "away_roster", default)]
    pub away_roster: Vec<String>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(rename = "homeScore", alias = "home_score")]
    pub home_score: u32,
    #[serde(rename = "awayScore", alias = "away_score")]
    pub away_score: u32,
}

impl Game {
    /// Attach a storage id to an uploaded game.
    pub fn from_upload(id: GameId, upload: UploadedGame) -> Self {
        Game {
            id,
            league_id: upload.league_id,
            week: upload.week,
            home_team: upload.home_team,
            away_team: upload.away_team,
            home_roster: upload.home_roster,
            away_roster: upload.away_roster,
            points: upload.points,
            home_score: upload.home_score,
            away_score: upload.away_score,
        }
    }

    /// Overwrite scores, rosters, points and week with an edit.
    pub fn apply_edit(&mut self, edit: EditedGame) {
        self.week = edit.week;
        self.home_roster = edit.home_roster;
        self.away_roster = edit.away_roster;
        self.points = edit.points;
        self.home_score = edit.home_score;
        self.away_score = edit.away_score;
    }

    /// Team label for a player based on this game's rosters alone.
    pub fn roster_team(&self, name: &str) -> Option<&str> {
        if self.home_roster.iter().any(|p| p == name) {
            Some(&self.home_team)
        } else if self.away_roster.iter().any(|p| p == name) {
            Some(&self.away_team)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
