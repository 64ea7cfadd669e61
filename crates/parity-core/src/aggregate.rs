// Season aggregation: folds per-game stat lines into one leaderboard.
//
// Aggregation is two-phase. `SeasonAccumulator` only ever holds running sums
// (counting stats plus the per-game derived metrics) and a games-played
// count; `finalize` is the single place those sums become per-game averages.
// Accumulators over disjoint game sets can be merged in any grouping and
// produce the same sums; only the team label depends on order (last game
// folded wins).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::event::Game;
use crate::player::{Gender, Player, PlayerId, Team, TeamId};
use crate::stat_line::{round_half_even, StatCounts, StatLine};

/// Label used when no roster or standing team names a player.
pub const UNKNOWN_TEAM: &str = "Unknown";

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Players and teams of one league, indexed for aggregation.
#[derive(Debug, Clone, Default)]
pub struct LeagueDirectory {
    players: HashMap<PlayerId, Player>,
    teams: HashMap<TeamId, Team>,
}

impl LeagueDirectory {
    pub fn new(players: Vec<Player>, teams: Vec<Team>) -> Self {
        LeagueDirectory {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
            teams: teams.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    /// Name of the player's standing team, if they have one.
    pub fn standing_team(&self, player: &Player) -> Option<&str> {
        player
            .team_id
            .and_then(|id| self.teams.get(&id))
            .map(|t| t.name.as_str())
    }
}

/// Team label for a player in one game: home roster, away roster, standing
/// team, then `Unknown`.
pub fn resolve_team(game: &Game, player_name: &str, standing_team: Option<&str>) -> String {
    game.roster_team(player_name)
        .or(standing_team)
        .unwrap_or(UNKNOWN_TEAM)
        .to_string()
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One player's merged line as the stats endpoints publish it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub counts: StatCounts,
    pub o_efficiency: f64,
    pub d_efficiency: f64,
    pub total_efficiency: f64,
    pub points_played: u32,
    pub pay: i64,
    pub salary_per_point: i64,
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// `/weeks/{n}` and `/stats` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekStats {
    pub week: u32,
    pub stats: BTreeMap<String, PlayerStats>,
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Running sums for one player. Never exposed un-finalized.
#[derive(Debug, Clone, Default, PartialEq)]
struct RunningTotals {
    counts: StatCounts,
    pay: i64,
    salary_per_point: i64,
    o_efficiency: f64,
    d_efficiency: f64,
    total_efficiency: f64,
    games_played: u32,
    team: String,
    gender: Option<Gender>,
}

impl RunningTotals {
    fn add_line(&mut self, line: &StatLine) {
        self.counts.add(&line.counts);
        self.pay += line.pay();
        self.salary_per_point += line.salary_per_point();
        self.o_efficiency += line.o_efficiency();
        self.d_efficiency += line.d_efficiency();
        self.total_efficiency += line.total_efficiency();
        self.games_played += 1;
    }

    fn absorb(&mut self, later: RunningTotals) {
        self.counts.add(&later.counts);
        self.pay += later.pay;
        self.salary_per_point += later.salary_per_point;
        self.o_efficiency += later.o_efficiency;
        self.d_efficiency += later.d_efficiency;
        self.total_efficiency += later.total_efficiency;
        self.games_played += later.games_played;
        self.team = later.team;
        if later.gender.is_some() {
            self.gender = later.gender;
        }
    }

    fn finalize(self) -> PlayerStats {
        // games_played >= 1 for every entry: totals only exist once a line is added.
        let games = f64::from(self.games_played.max(1));
        PlayerStats {
            points_played: self.counts.points_played(),
            counts: self.counts,
            o_efficiency: self.o_efficiency / games,
            d_efficiency: self.d_efficiency / games,
            total_efficiency: self.total_efficiency / games,
            pay: round_half_even(self.pay as f64 / games),
            salary_per_point: round_half_even(self.salary_per_point as f64 / games),
            team: self.team,
            gender: self.gender,
        }
    }
}

/// Sum phase of season aggregation, keyed by player display name.
#[derive(Debug, Clone, Default)]
pub struct SeasonAccumulator {
    totals: BTreeMap<String, RunningTotals>,
}

impl SeasonAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Games folded in so far for `name`.
    pub fn games_played(&self, name: &str) -> u32 {
        self.totals.get(name).map(|t| t.games_played).unwrap_or(0)
    }

    /// Fold one stat line from `game`.
    pub fn add_line(
        &mut self,
        game: &Game,
        line: &StatLine,
        player: Option<&Player>,
        standing_team: Option<&str>,
    ) {
        let name = player
            .map(|p| p.name.as_str())
            .unwrap_or(line.player_name.as_str());

        let totals = self.totals.entry(name.to_string()).or_default();
        totals.add_line(line);
        totals.team = resolve_team(game, name, standing_team);
        if let Some(gender) = player.and_then(|p| p.gender) {
            totals.gender = Some(gender);
        }
    }

    /// Fold every stat line of one game, resolving players through `directory`.
    pub fn add_game(&mut self, game: &Game, lines: &[StatLine], directory: &LeagueDirectory) {
        for line in lines {
            let player = directory.player(line.player_id);
            if player.is_none() {
                warn!(
                    player_id = line.player_id,
                    game_id = game.id,
                    "stat line references unknown player '{}'",
                    line.player_name
                );
            }
            let standing = player.and_then(|p| directory.standing_team(p));
            self.add_line(game, line, player, standing);
        }
    }

    /// Merge sums from games folded after this accumulator's games.
    pub fn merge(&mut self, later: SeasonAccumulator) {
        for (name, totals) in later.totals {
            match self.totals.get_mut(&name) {
                Some(existing) => existing.absorb(totals),
                None => {
                    self.totals.insert(name, totals);
                }
            }
        }
    }

    /// Turn sums into per-game averages and publishable records.
    pub fn finalize(self) -> BTreeMap<String, PlayerStats> {
        self.totals
            .into_iter()
            .map(|(name, totals)| (name, totals.finalize()))
            .collect()
    }
}

/// Aggregate a set of games (in the order given) into one leaderboard.
pub fn aggregate<'a, I>(games: I, directory: &LeagueDirectory) -> BTreeMap<String, PlayerStats>
where
    I: IntoIterator<Item = (&'a Game, &'a [StatLine])>,
{
    let mut acc = SeasonAccumulator::new();
    for (game, lines) in games {
        acc.add_game(game, lines, directory);
    }
    acc.finalize()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::UploadedGame;
    use crate::league::StatValueVersion;
    use crate::stat_line::Stat;

    fn game(id: i64, home_roster: &[&str], away_roster: &[&str]) -> Game {
        Game::from_upload(
            id,
            UploadedGame {
                league_id: 1,
                week: id as u32,
                home_team: format!("Home{id}"),
                away_team: format!("Away{id}"),
                home_roster: home_roster.iter().map(|s| s.to_string()).collect(),
                away_roster: away_roster.iter().map(|s| s.to_string()).collect(),
                points: vec![],
                home_score: 0,
                away_score: 0,
            },
        )
    }

    fn line(game_id: i64, player_id: i64, name: &str, stats: &[(Stat, u32)]) -> StatLine {
        let mut l = StatLine::new(game_id, player_id, name, StatValueVersion::V2);
        for &(stat, n) in stats {
            for _ in 0..n {
                l.count(stat);
            }
        }
        l
    }

    fn directory() -> LeagueDirectory {
        let mut ann = Player::bare(1, 1, "Ann");
        ann.gender = Some(Gender::Female);
        ann.team_id = Some(7);
        let bo = Player::bare(2, 1, "Bo");
        LeagueDirectory::new(
            vec![ann, bo],
            vec![Team {
                id: 7,
                league_id: 1,
                name: "Standing".into(),
            }],
        )
    }

    #[test]
    fn empty_game_set_is_empty_mapping() {
        let out = aggregate(std::iter::empty(), &directory());
        assert!(out.is_empty());
    }

    #[test]
    fn counts_sum_and_derived_metrics_average() {
        let g1 = game(1, &["Ann"], &[]);
        let g2 = game(2, &["Ann"], &[]);
        // g1: 1 goal, 2 o points for -> pay 12000, spp 6000, o_eff 1.0
        let l1 = vec![line(1, 1, "Ann", &[(Stat::Goals, 1), (Stat::OPointsFor, 2)])];
        // g2: 1 drop, 1 o point against -> pay -4000, spp -4000, o_eff 0.0
        let l2 = vec![line(2, 1, "Ann", &[(Stat::Drops, 1), (Stat::OPointsAgainst, 1)])];

        let out = aggregate([(&g1, l1.as_slice()), (&g2, l2.as_slice())], &directory());
        let ann = &out["Ann"];

        assert_eq!(ann.counts.goals, 1);
        assert_eq!(ann.counts.drops, 1);
        assert_eq!(ann.points_played, 3);
        assert_eq!(ann.pay, 4000);
        assert_eq!(ann.salary_per_point, 1000);
        assert!((ann.o_efficiency - 0.5).abs() < 1e-12);
        assert!((ann.total_efficiency - 0.5).abs() < 1e-12);
        assert_eq!(ann.gender, Some(Gender::Female));
    }

    #[test]
    fn averaged_pay_rounds_half_to_even() {
        let games: Vec<Game> = (1..=8).map(|id| game(id, &["Bo"], &[])).collect();
        let mut lines: Vec<Vec<StatLine>> =
            (1..=8).map(|id| vec![line(id, 2, "Bo", &[])]).collect();

        // 500 over 8 games = 62.5
        lines[0] = vec![line(1, 2, "Bo", &[(Stat::Completions, 1)])];
        let out = aggregate(
            games.iter().zip(lines.iter().map(Vec::as_slice)),
            &directory(),
        );
        assert_eq!(out["Bo"].pay, 62);

        // 1500 over 8 games = 187.5
        lines[1] = vec![line(2, 2, "Bo", &[(Stat::Catches, 2)])];
        let out = aggregate(
            games.iter().zip(lines.iter().map(Vec::as_slice)),
            &directory(),
        );
        assert_eq!(out["Bo"].pay, 188);
    }

    #[test]
    fn team_label_priority() {
        let dir = directory();

        // home roster beats standing team
        let g = game(1, &["Ann"], &[]);
        let l = vec![line(1, 1, "Ann", &[])];
        assert_eq!(aggregate([(&g, l.as_slice())], &dir)["Ann"].team, "Home1");

        // away roster
        let g = game(2, &[], &["Ann"]);
        let l = vec![line(2, 1, "Ann", &[])];
        assert_eq!(aggregate([(&g, l.as_slice())], &dir)["Ann"].team, "Away2");

        // standing team
        let g = game(3, &[], &[]);
        let l = vec![line(3, 1, "Ann", &[])];
        assert_eq!(aggregate([(&g, l.as_slice())], &dir)["Ann"].team, "Standing");

        // nothing known
        let l = vec![line(3, 2, "Bo", &[])];
        assert_eq!(aggregate([(&g, l.as_slice())], &dir)["Bo"].team, UNKNOWN_TEAM);
    }

    #[test]
    fn last_game_team_label_wins() {
        let g1 = game(1, &["Bo"], &[]);
        let g2 = game(2, &[], &["Bo"]);
        let l1 = vec![line(1, 2, "Bo", &[])];
        let l2 = vec![line(2, 2, "Bo", &[])];
        let dir = directory();

        let forward = aggregate([(&g1, l1.as_slice()), (&g2, l2.as_slice())], &dir);
        let backward = aggregate([(&g2, l2.as_slice()), (&g1, l1.as_slice())], &dir);
        assert_eq!(forward["Bo"].team, "Away2");
        assert_eq!(backward["Bo"].team, "Home1");
    }

    #[test]
    fn merge_matches_single_pass_for_summed_fields() {
        let dir = directory();
        let games = [game(1, &["Ann"], &["Bo"]), game(2, &["Bo"], &["Ann"]), game(3, &["Ann"], &[])];
        let lines = [
            vec![
                line(1, 1, "Ann", &[(Stat::Goals, 2), (Stat::OPointsFor, 3), (Stat::DPointsAgainst, 1)]),
                line(1, 2, "Bo", &[(Stat::DBlocks, 1), (Stat::DPointsFor, 1), (Stat::OPointsAgainst, 3)]),
            ],
            vec![
                line(2, 1, "Ann", &[(Stat::ThrowAways, 1), (Stat::DPointsAgainst, 2)]),
                line(2, 2, "Bo", &[(Stat::Assists, 1), (Stat::OPointsFor, 2)]),
            ],
            vec![line(3, 1, "Ann", &[(Stat::Catches, 4), (Stat::OPointsFor, 5)])],
        ];

        let mut all = SeasonAccumulator::new();
        for (g, l) in games.iter().zip(lines.iter()) {
            all.add_game(g, l, &dir);
        }

        let mut first = SeasonAccumulator::new();
        first.add_game(&games[0], &lines[0], &dir);
        first.add_game(&games[1], &lines[1], &dir);
        let mut second = SeasonAccumulator::new();
        second.add_game(&games[2], &lines[2], &dir);
        first.merge(second);

        assert_eq!(first.games_played("Ann"), 3);
        assert_eq!(first.games_played("Bo"), 2);

        let merged = first.finalize();
        let direct = all.finalize();
        assert_eq!(merged.len(), direct.len());
        for (name, a) in &direct {
            let b = &merged[name];
            assert_eq!(a.counts, b.counts, "{name}");
            assert_eq!(a.points_played, b.points_played);
            assert_eq!(a.pay, b.pay);
            assert_eq!(a.salary_per_point, b.salary_per_point);
            assert!((a.o_efficiency - b.o_efficiency).abs() < 1e-12);
            assert!((a.d_efficiency - b.d_efficiency).abs() < 1e-12);
            assert!((a.total_efficiency - b.total_efficiency).abs() < 1e-12);
            // Team label is last-game-wins, so it matches here only because the
            // merged accumulator saw the games in the same final order.
            assert_eq!(a.team, b.team);
        }
    }

    #[test]
    fn unknown_player_id_falls_back_to_line_name() {
        let g = game(1, &["Ghost"], &[]);
        let l = vec![line(1, 99, "Ghost", &[(Stat::Goals, 1)])];
        let out = aggregate([(&g, l.as_slice())], &directory());
        assert_eq!(out["Ghost"].counts.goals, 1);
        assert_eq!(out["Ghost"].team, "Home1");
        assert_eq!(out["Ghost"].gender, None);
    }

    #[test]
    fn output_json_shape() {
        let g = game(1, &["Ann"], &[]);
        let l = vec![line(1, 1, "Ann", &[(Stat::Goals, 1)])];
        let stats = aggregate([(&g, l.as_slice())], &directory());
        let body = serde_json::to_value(WeekStats { week: 1, stats }).unwrap();
        let ann = &body["stats"]["Ann"];
        assert_eq!(ann["goals"], 1);
        assert_eq!(ann["team"], "Home1");
        assert_eq!(ann["gender"], "female");
        assert_eq!(ann["pay"], 10000);
        assert!(ann.get("games_played").is_none());
    }
}
