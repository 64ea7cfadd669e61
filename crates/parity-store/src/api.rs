// Read models: the JSON shapes served to the league's client apps.

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use parity_core::aggregate::{aggregate, LeagueDirectory, PlayerStats, WeekStats};
use parity_core::event::{Game, Point};
use parity_core::league::LeagueRecord;
use parity_core::player::{GameId, LeagueId, TeamId};
use parity_core::salary::{PlayerSalary, SalaryEstimator, SalarySettings};
use parity_core::stat_line::StatLine;

use crate::db::Database;

/// Week number that selects every game of the league.
pub const ALL_WEEKS: u32 = 0;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub id: LeagueId,
    pub name: String,
    #[serde(rename = "lineSize")]
    pub line_size: Option<u32>,
}

impl From<LeagueRecord> for LeagueSummary {
    fn from(record: LeagueRecord) -> Self {
        LeagueSummary {
            id: record.id,
            name: record.name,
            line_size: record.line_size,
        }
    }
}

/// A game as listed in `/games`; points are only included on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: GameId,
    pub league_id: LeagueId,
    pub week: u32,
    #[serde(rename = "homeTeam")]
    pub home_team: String,
    #[serde(rename = "awayTeam")]
    pub away_team: String,
    #[serde(rename = "homeRoster")]
    pub home_roster: Vec<String>,
    #[serde(rename = "awayRoster")]
    pub away_roster: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(rename = "homeScore")]
    pub home_score: u32,
    #[serde(rename = "awayScore")]
    pub away_score: u32,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

impl GameSummary {
    fn new(game: Game, uploaded_at: DateTime<Utc>, include_points: bool) -> Self {
        GameSummary {
            id: game.id,
            league_id: game.league_id,
            week: game.week,
            home_team: game.home_team,
            away_team: game.away_team,
            home_roster: game.home_roster,
            away_roster: game.away_roster,
            points: include_points.then_some(game.points),
            home_score: game.home_score,
            away_score: game.away_score,
            uploaded_at,
        }
    }
}

/// One game plus the stat lines computed from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameWithStats {
    #[serde(flatten)]
    pub game: Game,
    pub stats: BTreeMap<String, PlayerStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPlayer {
    pub name: String,
    pub team: String,
    pub is_male: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub id: TeamId,
    pub name: String,
    pub players: Vec<TeamPlayer>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn leagues(db: &Database) -> Result<Vec<LeagueSummary>> {
    Ok(db.leagues()?.into_iter().map(LeagueSummary::from).collect())
}

/// Weeks with at least one game, ascending.
pub fn weeks(db: &Database, league_id: LeagueId) -> Result<Vec<u32>> {
    db.weeks(league_id)
}

pub fn games(db: &Database, league_id: LeagueId, include_points: bool) -> Result<Vec<GameSummary>> {
    Ok(db
        .games_with_upload_times(league_id)?
        .into_iter()
        .map(|(g, at)| GameSummary::new(g, at, include_points))
        .collect())
}

/// Leaderboard for one week, or for the whole season when `week` is
/// `ALL_WEEKS`. Games are folded in week order so the latest team label wins.
pub fn week_stats(db: &Database, league_id: LeagueId, week: u32) -> Result<WeekStats> {
    let filter = (week != ALL_WEEKS).then_some(week);
    let games = db.games(league_id, filter)?;
    let stats = build_stats(db, league_id, &games)?;
    debug!(league_id, week, games = games.len(), players = stats.len(), "built week stats");
    Ok(WeekStats { week, stats })
}

/// A single game with its leaderboard. Fails when the game is not part of
/// the league.
pub fn game_with_stats(db: &Database, league_id: LeagueId, game_id: GameId) -> Result<GameWithStats> {
    let Some(game) = db.game(game_id)?.filter(|g| g.league_id == league_id) else {
        bail!("game {game_id} not found in league {league_id}");
    };
    let stats = build_stats(db, league_id, std::slice::from_ref(&game))?;
    Ok(GameWithStats { game, stats })
}

/// Salary table for every player holding a standing team.
pub fn players(
    db: &Database,
    league_id: LeagueId,
    settings: SalarySettings,
) -> Result<Vec<PlayerSalary>> {
    let league = db.league(league_id)?;
    let players = db.players(league_id)?;
    let teams = db.teams(league_id)?;
    let lines = db.stat_lines_for_league(league_id)?;

    let estimator = SalaryEstimator::new(league.salary_calc, settings);
    Ok(estimator.estimate(&players, &teams, &lines))
}

/// Teams with their standing rosters.
pub fn teams(db: &Database, league_id: LeagueId) -> Result<Vec<TeamRoster>> {
    let players = db.players(league_id)?;
    let rosters = db
        .teams(league_id)?
        .into_iter()
        .map(|team| {
            let members = players
                .iter()
                .filter(|p| p.team_id == Some(team.id))
                .map(|p| TeamPlayer {
                    name: p.name.clone(),
                    team: team.name.clone(),
                    is_male: p.is_male(),
                })
                .collect();
            TeamRoster {
                id: team.id,
                name: team.name,
                players: members,
            }
        })
        .collect();
    Ok(rosters)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_stats(
    db: &Database,
    league_id: LeagueId,
    games: &[Game],
) -> Result<BTreeMap<String, PlayerStats>> {
    if games.is_empty() {
        return Ok(BTreeMap::new());
    }

    let directory = LeagueDirectory::new(db.players(league_id)?, db.teams(league_id)?);

    let mut by_game: HashMap<GameId, Vec<StatLine>> = HashMap::new();
    if let [game] = games {
        by_game.insert(game.id, db.stat_lines_for_game(game.id)?);
    } else {
        for line in db.stat_lines_for_league(league_id)? {
            by_game.entry(line.game_id).or_default().push(line);
        }
    }

    Ok(aggregate(
        games.iter().map(|g| {
            let lines = by_game.get(&g.id).map(Vec::as_slice).unwrap_or(&[]);
            (g, lines)
        }),
        &directory,
    ))
}
