// SQLite persistence layer for leagues, games and stat lines.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use parity_core::calculator::{GameStatCalculator, GameStats};
use parity_core::event::{EditedGame, Game, Point, UploadedGame};
use parity_core::league::{League, LeagueRecord, StatValueVersion};
use parity_core::player::{Gender, GameId, LeagueId, Player, PlayerId, Team, TeamId};
use parity_core::repository::{PlayerRepository, RepositoryError};
use parity_core::stat_line::{Stat, StatLine};

/// SQLite-backed persistence for the stats server. Every workflow that
/// writes stat lines runs inside one transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(&schema())
            .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Insert a league or overwrite its settings if the id already exists.
    pub fn upsert_league(&self, league: &League) -> Result<()> {
        let conn = self.conn();
        upsert_league(&conn, &LeagueRecord::from(league))
    }

    /// Upsert every configured league in a single transaction.
    pub fn seed_leagues(&self, leagues: &[League]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin seed transaction")?;
        for league in leagues {
            upsert_league(&tx, &LeagueRecord::from(league))?;
        }
        tx.commit().context("failed to commit league seed")?;
        info!(leagues = leagues.len(), "seeded leagues");
        Ok(())
    }

    /// Insert a raw league row, bypassing configuration checks. Legacy
    /// databases can hold leagues without a pay table or salary model.
    pub fn upsert_league_record(&self, record: &LeagueRecord) -> Result<()> {
        let conn = self.conn();
        upsert_league(&conn, record)
    }

    /// Insert a team (unique per league by name) and return its id.
    pub fn upsert_team(&self, league_id: LeagueId, name: &str) -> Result<TeamId> {
        let conn = self.conn();
        let id: TeamId = conn
            .query_row(
                "INSERT INTO teams (league_id, name) VALUES (?1, ?2)
                 ON CONFLICT(league_id, name) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![league_id, name],
                |row| row.get(0),
            )
            .context("failed to upsert team")?;
        Ok(id)
    }

    /// Insert a player or update their team / gender / fallback salary if
    /// the `(league_id, name)` row already exists. Returns the row id.
    pub fn upsert_player(
        &self,
        league_id: LeagueId,
        name: &str,
        team_id: Option<TeamId>,
        gender: Option<Gender>,
        fallback_salary: Option<i64>,
    ) -> Result<PlayerId> {
        let conn = self.conn();
        let id: PlayerId = conn
            .query_row(
                "INSERT INTO players (league_id, name, team_id, gender, fallback_salary)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(league_id, name) DO UPDATE SET
                    team_id         = excluded.team_id,
                    gender          = excluded.gender,
                    fallback_salary = excluded.fallback_salary
                 RETURNING id",
                params![
                    league_id,
                    name,
                    team_id,
                    gender.map(|g| g.as_str()),
                    fallback_salary
                ],
                |row| row.get(0),
            )
            .context("failed to upsert player")?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Loaders
    // ------------------------------------------------------------------

    pub fn leagues(&self) -> Result<Vec<LeagueRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, stat_values, salary_calc, line_size
                 FROM leagues ORDER BY id",
            )
            .context("failed to prepare leagues query")?;
        let leagues = stmt
            .query_map([], league_from_row)
            .context("failed to query leagues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map league rows")?;
        Ok(leagues)
    }

    pub fn league_record(&self, league_id: LeagueId) -> Result<Option<LeagueRecord>> {
        let conn = self.conn();
        league_record(&conn, league_id)
    }

    /// A league whose pay table and salary model are usable. Missing
    /// configuration is an error, never a default.
    pub fn league(&self, league_id: LeagueId) -> Result<League> {
        let conn = self.conn();
        load_league(&conn, league_id)
    }

    pub fn game(&self, game_id: GameId) -> Result<Option<Game>> {
        let conn = self.conn();
        load_game(&conn, game_id)
    }

    /// Games of a league, optionally restricted to one week, ordered by week
    /// then id.
    pub fn games(&self, league_id: LeagueId, week: Option<u32>) -> Result<Vec<Game>> {
        let conn = self.conn();
        load_games(&conn, league_id, week)
    }

    /// Games of a league ordered by week then id, each with the time it was
    /// uploaded.
    pub fn games_with_upload_times(
        &self,
        league_id: LeagueId,
    ) -> Result<Vec<(Game, DateTime<Utc>)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {GAME_COLUMNS}, uploaded_at FROM games
                 WHERE league_id = ?1
                 ORDER BY week, id"
            ))
            .context("failed to prepare games query")?;
        let games = stmt
            .query_map(params![league_id], |row| {
                let raw: String = row.get(10)?;
                let uploaded_at = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| conversion_error(10, format!("bad uploaded_at `{raw}`: {e}")))?
                    .with_timezone(&Utc);
                Ok((game_from_row(row)?, uploaded_at))
            })
            .context("failed to query games")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map game rows")?;
        Ok(games)
    }

    /// Distinct weeks with at least one game, ascending.
    pub fn weeks(&self, league_id: LeagueId) -> Result<Vec<u32>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT DISTINCT week FROM games WHERE league_id = ?1 ORDER BY week")
            .context("failed to prepare weeks query")?;
        let weeks = stmt
            .query_map(params![league_id], |row| row.get(0))
            .context("failed to query weeks")?
            .collect::<std::result::Result<Vec<u32>, _>>()
            .context("failed to map week rows")?;
        Ok(weeks)
    }

    pub fn stat_lines_for_game(&self, game_id: GameId) -> Result<Vec<StatLine>> {
        let conn = self.conn();
        load_stat_lines(&conn, "s.game_id = ?1", game_id)
    }

    /// Every stat line of every game in the league.
    pub fn stat_lines_for_league(&self, league_id: LeagueId) -> Result<Vec<StatLine>> {
        let conn = self.conn();
        load_stat_lines(&conn, "g.league_id = ?1", league_id)
    }

    /// Players of a league ordered by id.
    pub fn players(&self, league_id: LeagueId) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, league_id, name, gender, fallback_salary, team_id
                 FROM players WHERE league_id = ?1 ORDER BY id",
            )
            .context("failed to prepare players query")?;
        let players = stmt
            .query_map(params![league_id], player_from_row)
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        Ok(players)
    }

    /// Teams of a league ordered by id.
    pub fn teams(&self, league_id: LeagueId) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, league_id, name FROM teams WHERE league_id = ?1 ORDER BY id")
            .context("failed to prepare teams query")?;
        let teams = stmt
            .query_map(params![league_id], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    league_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;
        Ok(teams)
    }

    // ------------------------------------------------------------------
    // Workflows
    // ------------------------------------------------------------------

    /// Store an uploaded game and its computed stat lines atomically.
    /// Players named in the game but unknown to the league are created.
    pub fn upload_game(&self, upload: UploadedGame) -> Result<GameStats> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin upload transaction")?;

        let league = load_league(&tx, upload.league_id)?;
        let game_id = insert_game(&tx, &upload)?;
        let game = Game::from_upload(game_id, upload);

        let stats = compute_and_store(&tx, &league, &game)?;

        tx.commit().context("failed to commit game upload")?;
        info!(
            game_id,
            league_id = game.league_id,
            week = game.week,
            lines = stats.lines.len(),
            "uploaded game"
        );
        Ok(stats)
    }

    /// Replace a game's content and recompute the stat lines of every game
    /// in its (possibly new) week. Returns the ids of the recomputed games.
    pub fn edit_game(
        &self,
        league_id: LeagueId,
        game_id: GameId,
        edit: EditedGame,
    ) -> Result<Vec<GameId>> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin edit transaction")?;

        let Some(mut game) = load_game(&tx, game_id)?.filter(|g| g.league_id == league_id) else {
            bail!("game {game_id} not found in league {league_id}");
        };
        let league = load_league(&tx, league_id)?;

        game.apply_edit(edit);
        update_game(&tx, &game)?;

        let week_games = load_games(&tx, league_id, Some(game.week))?;
        let ids: Vec<GameId> = week_games.iter().map(|g| g.id).collect();

        for id in &ids {
            tx.execute("DELETE FROM stats WHERE game_id = ?1", params![id])
                .context("failed to delete stale stat lines")?;
        }
        for week_game in &week_games {
            compute_and_store(&tx, &league, week_game)?;
        }

        tx.commit().context("failed to commit game edit")?;
        info!(
            game_id,
            league_id,
            week = game.week,
            recomputed = ids.len(),
            "edited game and recomputed week"
        );
        Ok(ids)
    }

    /// Delete a game and its stat lines. Returns `false` when no such game
    /// exists in the league.
    pub fn delete_game(&self, league_id: LeagueId, game_id: GameId) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin delete transaction")?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM games WHERE id = ?1 AND league_id = ?2)",
                params![game_id, league_id],
                |row| row.get(0),
            )
            .context("failed to check game existence")?;
        if !exists {
            return Ok(false);
        }

        let lines = tx
            .execute("DELETE FROM stats WHERE game_id = ?1", params![game_id])
            .context("failed to delete game stat lines")?;
        tx.execute("DELETE FROM games WHERE id = ?1", params![game_id])
            .context("failed to delete game")?;

        tx.commit().context("failed to commit game delete")?;
        info!(game_id, league_id, lines, "deleted game");
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Player repository over an open connection / transaction
// ---------------------------------------------------------------------------

/// Finds or creates players through a borrowed connection, so the lookups
/// share the caller's transaction.
pub struct SqlPlayers<'c> {
    conn: &'c Connection,
}

impl<'c> SqlPlayers<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqlPlayers { conn }
    }
}

impl PlayerRepository for SqlPlayers<'_> {
    fn find_or_create_player(
        &mut self,
        league_id: LeagueId,
        name: &str,
    ) -> std::result::Result<Player, RepositoryError> {
        let existing = self
            .conn
            .query_row(
                "SELECT id, league_id, name, gender, fallback_salary, team_id
                 FROM players WHERE league_id = ?1 AND name = ?2",
                params![league_id, name],
                player_from_row,
            )
            .optional()
            .map_err(|e| RepositoryError::Lookup {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        if let Some(player) = existing {
            return Ok(player);
        }

        let id: PlayerId = self
            .conn
            .query_row(
                "INSERT INTO players (league_id, name) VALUES (?1, ?2) RETURNING id",
                params![league_id, name],
                |row| row.get(0),
            )
            .map_err(|e| RepositoryError::Create {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        debug!(league_id, player_id = id, "created player '{}'", name);
        Ok(Player::bare(id, league_id, name))
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

fn stat_columns() -> String {
    Stat::ALL
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn schema() -> String {
    let stat_defs: String = Stat::ALL
        .iter()
        .map(|s| format!("                {} INTEGER NOT NULL DEFAULT 0,\n", s.name()))
        .collect();

    format!(
        "
            CREATE TABLE IF NOT EXISTS leagues (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL,
                stat_values TEXT,
                salary_calc TEXT,
                line_size   INTEGER
            );

            CREATE TABLE IF NOT EXISTS teams (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL REFERENCES leagues(id),
                name      TEXT NOT NULL,
                UNIQUE(league_id, name)
            );

            CREATE TABLE IF NOT EXISTS players (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id       INTEGER NOT NULL REFERENCES leagues(id),
                name            TEXT NOT NULL,
                team_id         INTEGER REFERENCES teams(id),
                gender          TEXT,
                fallback_salary INTEGER,
                UNIQUE(league_id, name)
            );

            CREATE TABLE IF NOT EXISTS games (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id   INTEGER NOT NULL REFERENCES leagues(id),
                week        INTEGER NOT NULL,
                home_team   TEXT NOT NULL,
                away_team   TEXT NOT NULL,
                home_roster TEXT NOT NULL,
                away_roster TEXT NOT NULL,
                points      TEXT NOT NULL,
                home_score  INTEGER NOT NULL,
                away_score  INTEGER NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_league_week ON games(league_id, week);

            CREATE TABLE IF NOT EXISTS stats (
                game_id     INTEGER NOT NULL REFERENCES games(id),
                player_id   INTEGER NOT NULL REFERENCES players(id),
                stat_values TEXT NOT NULL,
{stat_defs}                PRIMARY KEY (game_id, player_id)
            );
            "
    )
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn league_from_row(row: &Row<'_>) -> rusqlite::Result<LeagueRecord> {
    Ok(LeagueRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        stat_values: row.get(2)?,
        salary_calc: row.get(3)?,
        line_size: row.get(4)?,
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let gender: Option<String> = row.get(3)?;
    Ok(Player {
        id: row.get(0)?,
        league_id: row.get(1)?,
        name: row.get(2)?,
        gender: gender.as_deref().and_then(Gender::parse),
        fallback_salary: row.get(4)?,
        team_id: row.get(5)?,
    })
}

const GAME_COLUMNS: &str = "id, league_id, week, home_team, away_team, home_roster, \
                            away_roster, points, home_score, away_score";

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    let points: Vec<Point> = json_column(row, 7)?;
    Ok(Game {
        id: row.get(0)?,
        league_id: row.get(1)?,
        week: row.get(2)?,
        home_team: row.get(3)?,
        away_team: row.get(4)?,
        home_roster: json_column(row, 5)?,
        away_roster: json_column(row, 6)?,
        points,
        home_score: row.get(8)?,
        away_score: row.get(9)?,
    })
}

/// Columns: game_id, player_id, name, stat_values, then `Stat::ALL` in order.
fn stat_line_from_row(row: &Row<'_>) -> rusqlite::Result<StatLine> {
    let raw_values: String = row.get(3)?;
    let values = StatValueVersion::parse(&raw_values)
        .ok_or_else(|| conversion_error(3, format!("unknown stat value table `{raw_values}`")))?;

    let mut line = StatLine::new(row.get(0)?, row.get(1)?, row.get::<_, String>(2)?, values);
    for (offset, stat) in Stat::ALL.iter().enumerate() {
        line.counts.set(*stat, row.get(4 + offset)?);
    }
    Ok(line)
}

// ---------------------------------------------------------------------------
// Connection-level helpers (shared by plain calls and transactions)
// ---------------------------------------------------------------------------

fn upsert_league(conn: &Connection, record: &LeagueRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO leagues (id, name, stat_values, salary_calc, line_size)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            name        = excluded.name,
            stat_values = excluded.stat_values,
            salary_calc = excluded.salary_calc,
            line_size   = excluded.line_size",
        params![
            record.id,
            record.name,
            record.stat_values,
            record.salary_calc,
            record.line_size
        ],
    )
    .context("failed to upsert league")?;
    Ok(())
}

fn league_record(conn: &Connection, league_id: LeagueId) -> Result<Option<LeagueRecord>> {
    conn.query_row(
        "SELECT id, name, stat_values, salary_calc, line_size FROM leagues WHERE id = ?1",
        params![league_id],
        league_from_row,
    )
    .optional()
    .context("failed to load league")
}

fn load_league(conn: &Connection, league_id: LeagueId) -> Result<League> {
    let Some(record) = league_record(conn, league_id)? else {
        bail!("league {league_id} not found");
    };
    let league = League::try_from(record)?;
    Ok(league)
}

fn load_game(conn: &Connection, game_id: GameId) -> Result<Option<Game>> {
    conn.query_row(
        &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
        params![game_id],
        game_from_row,
    )
    .optional()
    .context("failed to load game")
}

fn load_games(conn: &Connection, league_id: LeagueId, week: Option<u32>) -> Result<Vec<Game>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE league_id = ?1 AND (?2 IS NULL OR week = ?2)
             ORDER BY week, id"
        ))
        .context("failed to prepare games query")?;
    let games = stmt
        .query_map(params![league_id, week], game_from_row)
        .context("failed to query games")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map game rows")?;
    Ok(games)
}

fn load_stat_lines(conn: &Connection, filter: &str, key: i64) -> Result<Vec<StatLine>> {
    let cols = Stat::ALL
        .iter()
        .map(|s| format!("s.{}", s.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT s.game_id, s.player_id, p.name, s.stat_values, {cols}
             FROM stats s
             JOIN players p ON p.id = s.player_id
             JOIN games g ON g.id = s.game_id
             WHERE {filter}
             ORDER BY g.week, s.game_id, s.rowid"
        ))
        .context("failed to prepare stat lines query")?;
    let lines = stmt
        .query_map(params![key], stat_line_from_row)
        .context("failed to query stat lines")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map stat line rows")?;
    Ok(lines)
}

fn insert_game(conn: &Connection, upload: &UploadedGame) -> Result<GameId> {
    let home_roster =
        serde_json::to_string(&upload.home_roster).context("failed to serialize home roster")?;
    let away_roster =
        serde_json::to_string(&upload.away_roster).context("failed to serialize away roster")?;
    let points = serde_json::to_string(&upload.points).context("failed to serialize points")?;
    let uploaded_at = Utc::now().to_rfc3339();

    let id: GameId = conn
        .query_row(
            "INSERT INTO games
                (league_id, week, home_team, away_team, home_roster, away_roster,
                 points, home_score, away_score, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id",
            params![
                upload.league_id,
                upload.week,
                upload.home_team,
                upload.away_team,
                home_roster,
                away_roster,
                points,
                upload.home_score,
                upload.away_score,
                uploaded_at,
            ],
            |row| row.get(0),
        )
        .context("failed to insert game")?;
    Ok(id)
}

fn update_game(conn: &Connection, game: &Game) -> Result<()> {
    let home_roster =
        serde_json::to_string(&game.home_roster).context("failed to serialize home roster")?;
    let away_roster =
        serde_json::to_string(&game.away_roster).context("failed to serialize away roster")?;
    let points = serde_json::to_string(&game.points).context("failed to serialize points")?;

    conn.execute(
        "UPDATE games SET
            week = ?2, home_roster = ?3, away_roster = ?4, points = ?5,
            home_score = ?6, away_score = ?7
         WHERE id = ?1",
        params![
            game.id,
            game.week,
            home_roster,
            away_roster,
            points,
            game.home_score,
            game.away_score,
        ],
    )
    .context("failed to update game")?;
    Ok(())
}

fn insert_stat_lines(conn: &Connection, lines: &[StatLine]) -> Result<()> {
    let placeholders = (1..=Stat::ALL.len() + 3)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn
        .prepare(&format!(
            "INSERT INTO stats (game_id, player_id, stat_values, {})
             VALUES ({placeholders})",
            stat_columns()
        ))
        .context("failed to prepare stat line insert")?;

    for line in lines {
        let mut values = vec![
            Value::Integer(line.game_id),
            Value::Integer(line.player_id),
            Value::Text(line.stat_values.as_str().to_string()),
        ];
        values.extend(
            Stat::ALL
                .iter()
                .map(|s| Value::Integer(i64::from(line.get(*s)))),
        );
        stmt.execute(params_from_iter(values))
            .with_context(|| format!("failed to insert stat line for {}", line.player_name))?;
    }
    Ok(())
}

fn compute_and_store(conn: &Connection, league: &League, game: &Game) -> Result<GameStats> {
    let mut players = SqlPlayers::new(conn);
    let stats = GameStatCalculator::new(league)
        .run(game, &mut players)
        .with_context(|| format!("failed to compute stats for game {}", game.id))?;
    insert_stat_lines(conn, &stats.lines)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
