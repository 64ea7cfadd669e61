// Game stat calculation: runs every point of a game through the processor.

use thiserror::Error;
use tracing::{info, warn};

use crate::event::Game;
use crate::league::{League, LeagueConfigError, LeagueRecord};
use crate::player::{GameId, LeagueId};
use crate::processor::{PointOutcome, PointProcessor, StatSheet};
use crate::repository::{PlayerRepository, RepositoryError};
use crate::stat_line::StatLine;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("league configuration error: {0}")]
    LeagueConfig(#[from] LeagueConfigError),

    #[error("player repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("game {game_id} belongs to league {game_league}, not league {league_id}")]
    LeagueMismatch {
        game_id: GameId,
        game_league: LeagueId,
        league_id: LeagueId,
    },
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The stat lines of one game, ready for persistence.
#[derive(Debug, Clone)]
pub struct GameStats {
    pub game_id: GameId,
    pub lines: Vec<StatLine>,
    /// Points that ended in a goal.
    pub scored_points: usize,
    /// Points with no goal recorded.
    pub incomplete_points: usize,
}

impl GameStats {
    pub fn line(&self, name: &str) -> Option<&StatLine> {
        self.lines.iter().find(|l| l.player_name == name)
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Derives per-player stat lines for a game under one league's value table.
#[derive(Debug, Clone, Copy)]
pub struct GameStatCalculator<'a> {
    league: &'a League,
}

impl<'a> GameStatCalculator<'a> {
    pub fn new(league: &'a League) -> Self {
        GameStatCalculator { league }
    }

    /// Process every point of `game`, creating unknown players through `repo`.
    pub fn run<R: PlayerRepository>(
        &self,
        game: &Game,
        repo: &mut R,
    ) -> Result<GameStats, StatsError> {
        if game.league_id != self.league.id {
            return Err(StatsError::LeagueMismatch {
                game_id: game.id,
                game_league: game.league_id,
                league_id: self.league.id,
            });
        }

        let mut sheet = StatSheet::new(game.id, self.league.id, self.league.stat_values);
        let mut scored_points = 0;
        let mut incomplete_points = 0;
        let mut home_goals = 0u32;
        let mut away_goals = 0u32;

        {
            let mut processor = PointProcessor::new(repo, &mut sheet);
            for (idx, point) in game.points.iter().enumerate() {
                match processor.process(point)? {
                    PointOutcome::Scored { scorer, .. } => {
                        scored_points += 1;
                        match game.roster_team(&scorer) {
                            Some(team) if team == game.home_team => home_goals += 1,
                            Some(_) => away_goals += 1,
                            None => {}
                        }
                    }
                    PointOutcome::Incomplete => {
                        incomplete_points += 1;
                        warn!(game_id = game.id, point = idx, "point has no goal recorded");
                    }
                }
            }
        }

        if home_goals > game.home_score || away_goals > game.away_score {
            warn!(
                game_id = game.id,
                "recorded goals {}-{} exceed final score {}-{}",
                home_goals,
                away_goals,
                game.home_score,
                game.away_score
            );
        }

        info!(
            game_id = game.id,
            players = sheet.len(),
            points = game.points.len(),
            "computed game stats"
        );

        Ok(GameStats {
            game_id: game.id,
            lines: sheet.into_lines(),
            scored_points,
            incomplete_points,
        })
    }
}

/// Validate a raw league record and compute a game's stat lines under it.
pub fn compute_game_stats<R: PlayerRepository>(
    league: &LeagueRecord,
    game: &Game,
    repo: &mut R,
) -> Result<GameStats, StatsError> {
    let league = League::try_from(league.clone())?;
    GameStatCalculator::new(&league).run(game, repo)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, Point, UploadedGame};
    use crate::league::{SalaryCalc, StatValueVersion};
    use crate::repository::InMemoryPlayers;
    use crate::stat_line::Stat;

    fn league() -> League {
        League {
            id: 1,
            name: "Test".into(),
            stat_values: StatValueVersion::V2,
            salary_calc: SalaryCalc::ProRate,
            line_size: None,
        }
    }

    fn game(points: Vec<Point>) -> Game {
        Game::from_upload(
            10,
            UploadedGame {
                league_id: 1,
                week: 1,
                home_team: "Home".into(),
                away_team: "Away".into(),
                home_roster: vec!["H1".into(), "H2".into()],
                away_roster: vec!["A1".into(), "A2".into()],
                points,
                home_score: 1,
                away_score: 1,
            },
        )
    }

    #[test]
    fn accumulates_across_points() {
        let g = game(vec![
            Point::new(
                &["H1", "H2"],
                &["A1", "A2"],
                vec![Event::pull("A1"), Event::pass("H1", "H2"), Event::point("H2")],
            ),
            Point::new(
                &["A1", "A2"],
                &["H1", "H2"],
                vec![Event::pull("H1"), Event::pass("A2", "A1"), Event::point("A1")],
            ),
        ]);
        let mut repo = InMemoryPlayers::new();
        let stats = GameStatCalculator::new(&league()).run(&g, &mut repo).unwrap();

        assert_eq!(stats.scored_points, 2);
        assert_eq!(stats.incomplete_points, 0);
        assert_eq!(stats.lines.len(), 4);

        let h1 = stats.line("H1").unwrap();
        assert_eq!(h1.get(Stat::OPointsFor), 1);
        assert_eq!(h1.get(Stat::DPointsAgainst), 1);
        assert_eq!(h1.get(Stat::Pulls), 1);
        assert_eq!(h1.get(Stat::Assists), 1);
        assert_eq!(h1.points_played(), 2);
        assert!(stats.lines.iter().all(|l| l.game_id == 10));
        assert!(stats.lines.iter().all(|l| l.stat_values == StatValueVersion::V2));
    }

    #[test]
    fn creates_unknown_players_once() {
        let g = game(vec![
            Point::new(&["H1"], &["A1"], vec![Event::pull("A1"), Event::point("H1")]),
            Point::new(&["A1"], &["H1"], vec![Event::pull("H1"), Event::point("A1")]),
        ]);
        let mut repo = InMemoryPlayers::new();
        GameStatCalculator::new(&league()).run(&g, &mut repo).unwrap();
        assert_eq!(repo.players().len(), 2);
        assert_eq!(repo.created().len(), 2);
    }

    #[test]
    fn incomplete_points_are_counted_not_fatal() {
        let g = game(vec![Point::new(
            &["H1"],
            &["A1"],
            vec![Event::pull("A1"), Event::pass("H1", "H2")],
        )]);
        let mut repo = InMemoryPlayers::new();
        let stats = GameStatCalculator::new(&league()).run(&g, &mut repo).unwrap();
        assert_eq!(stats.incomplete_points, 1);
        assert_eq!(stats.line("A1").unwrap().get(Stat::Pulls), 1);
        assert!(stats.line("H1").is_none());
    }

    #[test]
    fn rejects_game_from_another_league() {
        let mut g = game(vec![]);
        g.league_id = 2;
        let mut repo = InMemoryPlayers::new();
        let err = GameStatCalculator::new(&league()).run(&g, &mut repo).unwrap_err();
        assert!(matches!(err, StatsError::LeagueMismatch { league_id: 1, .. }));
    }

    #[test]
    fn missing_league_configuration_surfaces() {
        let record = LeagueRecord {
            id: 1,
            name: "Legacy".into(),
            stat_values: None,
            salary_calc: Some("sum".into()),
            line_size: None,
        };
        let mut repo = InMemoryPlayers::new();
        let err = compute_game_stats(&record, &game(vec![]), &mut repo).unwrap_err();
        assert!(matches!(
            err,
            StatsError::LeagueConfig(LeagueConfigError::MissingStatValues { league_id: 1 })
        ));
    }
}
