// Parity stats command-line entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to stderr; stdout carries JSON only)
// 2. Load config
// 3. Open database and seed configured leagues
// 4. Run the requested command and print its JSON result

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use parity_core::event::{EditedGame, UploadedGame};
use parity_core::player::{Gender, GameId, LeagueId};
use parity_store::api;
use parity_store::config;
use parity_store::db::Database;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "parity")]
#[command(about = "Ultimate league stats: upload games, read leaderboards and salaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// List configured leagues
    Leagues,
    /// Weeks with at least one game
    Weeks { league: LeagueId },
    /// Games of a league
    Games {
        league: LeagueId,
        /// Include each game's points
        #[arg(long)]
        points: bool,
    },
    /// Leaderboard for one week (0 is the whole season)
    Stats {
        league: LeagueId,
        #[arg(default_value_t = api::ALL_WEEKS)]
        week: u32,
    },
    /// One game with its leaderboard
    Game { league: LeagueId, game: GameId },
    /// Salary table for rostered players
    Players { league: LeagueId },
    /// Teams with their standing rosters
    Teams { league: LeagueId },
    /// Upload a game from a JSON file (`-` reads stdin)
    Upload { source: String },
    /// Replace a game's content and recompute its week
    Edit {
        league: LeagueId,
        game: GameId,
        source: String,
    },
    /// Delete a game and its stat lines
    Delete { league: LeagueId, game: GameId },
    /// Add a team to a league
    AddTeam { league: LeagueId, name: String },
    /// Add or update a player
    AddPlayer {
        league: LeagueId,
        name: String,
        /// Standing team, created if missing
        #[arg(long)]
        team: Option<String>,
        /// male or female
        #[arg(long, value_parser = parse_gender)]
        gender: Option<Gender>,
        /// Salary used when stats cannot resolve one
        #[arg(long)]
        fallback: Option<i64>,
    },
}

fn parse_gender(raw: &str) -> std::result::Result<Gender, String> {
    Gender::parse(raw).ok_or_else(|| format!("unknown gender `{raw}`"))
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read game from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{text}");
    Ok(())
}

fn run(command: Command, db: &Database, config: &config::Config) -> Result<()> {
    match command {
        Command::Leagues => print_json(&api::leagues(db)?),
        Command::Weeks { league } => print_json(&api::weeks(db, league)?),
        Command::Games { league, points } => print_json(&api::games(db, league, points)?),
        Command::Stats { league, week } => print_json(&api::week_stats(db, league, week)?),
        Command::Game { league, game } => print_json(&api::game_with_stats(db, league, game)?),
        Command::Players { league } => print_json(&api::players(db, league, config.salary)?),
        Command::Teams { league } => print_json(&api::teams(db, league)?),
        Command::Upload { source } => {
            let upload: UploadedGame = serde_json::from_str(&read_source(&source)?)
                .context("failed to parse uploaded game")?;
            let stats = db.upload_game(upload)?;
            print_json(&serde_json::json!({
                "game_id": stats.game_id,
                "players": stats.lines.len(),
                "incomplete_points": stats.incomplete_points,
            }))
        }
        Command::Edit {
            league,
            game,
            source,
        } => {
            let edit: EditedGame = serde_json::from_str(&read_source(&source)?)
                .context("failed to parse edited game")?;
            let recomputed = db.edit_game(league, game, edit)?;
            print_json(&serde_json::json!({ "recomputed": recomputed }))
        }
        Command::Delete { league, game } => {
            if !db.delete_game(league, game)? {
                bail!("game {game} not found in league {league}");
            }
            print_json(&"OK")
        }
        Command::AddTeam { league, name } => {
            let id = db.upsert_team(league, &name)?;
            print_json(&serde_json::json!({ "id": id, "name": name }))
        }
        Command::AddPlayer {
            league,
            name,
            team,
            gender,
            fallback,
        } => {
            let team_id = match team {
                Some(team) => Some(db.upsert_team(league, &team)?),
                None => None,
            };
            let id = db.upsert_player(league, &name, team_id, gender, fallback)?;
            print_json(&serde_json::json!({ "id": id, "name": name }))
        }
    }
}

fn main() -> Result<()> {
    // 1. Initialize tracing (stderr, so stdout stays machine-readable)
    init_tracing()?;

    let cli = Cli::parse();

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} league(s), database at {}",
        config.leagues.len(),
        config.db_path
    );

    // 3. Open database and seed leagues
    let db = Database::open(&config.db_path).context("failed to open database")?;
    db.seed_leagues(&config.leagues)
        .context("failed to seed leagues")?;

    // 4. Run the command
    run(cli.command, &db, &config)
}

/// Initialize tracing to stderr.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parity=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
