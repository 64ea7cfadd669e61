// Point processing: walks one point's events and credits counting stats.
//
// The walk is a small state machine over "what just happened". A pass is
// held in flight until the next event settles it: anything but a drop makes
// it a completion, a drop turns it into a threw-drop, and the end of the
// point leaves it unresolved. Goals look back at the last two plays to hand
// out assists or a callahan, then credit both lines on the field.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::event::{Event, EventType, Point};
use crate::league::StatValueVersion;
use crate::player::{GameId, LeagueId, PlayerId};
use crate::repository::{PlayerRepository, RepositoryError};
use crate::stat_line::{Stat, StatLine};

// ---------------------------------------------------------------------------
// Plays and credits
// ---------------------------------------------------------------------------

/// A play the tracker remembers while walking a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Play {
    Pull { by: String },
    Pass { thrower: String, receiver: Option<String> },
    Drop { by: String },
    Throwaway { by: String },
    Defense { by: String },
    Goal { by: String },
}

impl Play {
    fn from_event(event: &Event) -> Self {
        let by = event.first_actor.clone();
        match event.event_type {
            EventType::Pull => Play::Pull { by },
            EventType::Pass => Play::Pass {
                thrower: by,
                receiver: event.second_actor.clone(),
            },
            EventType::Drop => Play::Drop { by },
            EventType::Throwaway => Play::Throwaway { by },
            EventType::Defense => Play::Defense { by },
            EventType::Point => Play::Goal { by },
        }
    }

    /// The player who made the play (the thrower, for passes).
    pub fn actor(&self) -> &str {
        match self {
            Play::Pull { by }
            | Play::Drop { by }
            | Play::Throwaway { by }
            | Play::Defense { by }
            | Play::Goal { by } => by,
            Play::Pass { thrower, .. } => thrower,
        }
    }
}

/// One stat to count for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub player: String,
    pub stat: Stat,
}

impl Credit {
    fn new(player: &str, stat: Stat) -> Self {
        Credit {
            player: player.to_string(),
            stat,
        }
    }
}

/// How a point ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOutcome {
    /// A goal was recorded. With several goals, the last one is reported.
    Scored { scorer: String, by_offense: bool },
    /// No goal was recorded; only individual plays were credited.
    Incomplete,
}

/// Everything a single point produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointReport {
    pub credits: Vec<Credit>,
    pub outcome: PointOutcome,
    /// Thrower of a pass that was still in flight when the events ran out.
    pub dangling_pass: Option<String>,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Walks a point's events, remembering the last two plays.
#[derive(Debug, Clone, Default)]
pub struct PointTracker {
    last: Option<Play>,
    prior: Option<Play>,
    goals: Vec<(String, bool)>,
    credits: Vec<Credit>,
}

impl PointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent play, if any.
    pub fn last(&self) -> Option<&Play> {
        self.last.as_ref()
    }

    /// The play before the most recent one, if any.
    pub fn prior(&self) -> Option<&Play> {
        self.prior.as_ref()
    }

    /// True while a pass is waiting on the next event to be settled.
    pub fn pass_in_flight(&self) -> bool {
        matches!(self.last, Some(Play::Pass { .. }))
    }

    /// Feed the next event of `point`.
    pub fn step(&mut self, event: &Event, point: &Point) {
        self.settle_pass(event.event_type);

        let actor = event.first_actor.as_str();
        match event.event_type {
            EventType::Pull => self.credit(actor, Stat::Pulls),
            // Credited when the next event arrives.
            EventType::Pass => {}
            EventType::Drop => {
                self.credit(actor, Stat::Drops);
                match self.last.as_ref().map(|p| p.actor().to_string()) {
                    Some(thrower) => self.credit(&thrower, Stat::ThrewDrops),
                    None => warn!("drop by '{}' opens the point; no thrower to charge", actor),
                }
            }
            EventType::Throwaway => self.credit(actor, Stat::ThrowAways),
            EventType::Defense => self.credit(actor, Stat::DBlocks),
            EventType::Point => self.score(actor, point),
        }

        self.prior = self.last.take();
        self.last = Some(Play::from_event(event));
    }

    /// Close the point and hand back its credits.
    pub fn finish(self) -> PointReport {
        let dangling_pass = match &self.last {
            Some(Play::Pass { thrower, .. }) => {
                warn!("pass by '{}' ends the point unresolved", thrower);
                Some(thrower.clone())
            }
            _ => None,
        };

        if self.goals.len() > 1 {
            warn!("point recorded {} goals", self.goals.len());
        }

        let outcome = match self.goals.last() {
            Some((scorer, by_offense)) => PointOutcome::Scored {
                scorer: scorer.clone(),
                by_offense: *by_offense,
            },
            None => PointOutcome::Incomplete,
        };

        PointReport {
            credits: self.credits,
            outcome,
            dangling_pass,
        }
    }

    fn credit(&mut self, player: &str, stat: Stat) {
        self.credits.push(Credit::new(player, stat));
    }

    fn settle_pass(&mut self, next: EventType) {
        if next == EventType::Drop {
            return;
        }
        if let Some(Play::Pass { thrower, receiver }) = &self.last {
            let thrower = thrower.clone();
            let receiver = receiver.clone();
            self.credit(&thrower, Stat::Completions);
            match receiver {
                Some(receiver) => self.credit(&receiver, Stat::Catches),
                None => warn!("pass by '{}' has no receiver; catch not credited", thrower),
            }
        }
    }

    fn score(&mut self, scorer: &str, point: &Point) {
        self.credit(scorer, Stat::Goals);

        let mut lead_in = Vec::new();
        match (&self.last, &self.prior) {
            (Some(Play::Pass { thrower, receiver }), prior)
                if receiver.as_deref() == Some(scorer) =>
            {
                lead_in.push(Credit::new(thrower, Stat::Assists));
                if let Some(Play::Pass { thrower: earlier, .. }) = prior {
                    lead_in.push(Credit::new(earlier, Stat::SecondAssists));
                }
            }
            (Some(Play::Defense { .. }) | Some(Play::Drop { .. }), _) => {
                lead_in.push(Credit::new(scorer, Stat::Callahan));
            }
            (None, _) => warn!("goal by '{}' has no preceding play", scorer),
            _ => {}
        }
        self.credits.extend(lead_in);

        let by_offense = point.is_on_offense(scorer);
        let (offense_stat, defense_stat) = if by_offense {
            (Stat::OPointsFor, Stat::DPointsAgainst)
        } else {
            (Stat::OPointsAgainst, Stat::DPointsFor)
        };

        let (offense, defense) = on_field(point);
        for player in offense {
            self.credit(player, offense_stat);
        }
        for player in defense {
            self.credit(player, defense_stat);
        }

        self.goals.push((scorer.to_string(), by_offense));
    }
}

/// The two lines, each player listed once. A name on both lines plays
/// offense so nobody is credited with two roles on one point.
fn on_field(point: &Point) -> (Vec<&str>, Vec<&str>) {
    let mut seen = HashSet::new();
    let offense: Vec<&str> = point
        .offense_players
        .iter()
        .map(String::as_str)
        .filter(|p| seen.insert(*p))
        .collect();
    let defense: Vec<&str> = point
        .defense_players
        .iter()
        .map(String::as_str)
        .filter(|p| seen.insert(*p))
        .collect();
    (offense, defense)
}

/// Run the state machine over a whole point without touching any stat lines.
pub fn classify_point(point: &Point) -> PointReport {
    let overlap = point.roster_overlap();
    if !overlap.is_empty() {
        warn!("players on both lines of a point: {:?}", overlap);
    }

    let mut tracker = PointTracker::new();
    for event in &point.events {
        tracker.step(event, point);
    }
    tracker.finish()
}

// ---------------------------------------------------------------------------
// Stat sheet
// ---------------------------------------------------------------------------

/// The stat lines of one game, keyed by player, in first-credited order.
#[derive(Debug, Clone)]
pub struct StatSheet {
    game_id: GameId,
    league_id: LeagueId,
    stat_values: StatValueVersion,
    lines: Vec<StatLine>,
    by_player: HashMap<PlayerId, usize>,
    by_name: HashMap<String, PlayerId>,
}

impl StatSheet {
    pub fn new(game_id: GameId, league_id: LeagueId, stat_values: StatValueVersion) -> Self {
        StatSheet {
            game_id,
            league_id,
            stat_values,
            lines: Vec::new(),
            by_player: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Count `stat` for `name`, resolving (or creating) the player first.
    pub fn credit<R: PlayerRepository>(
        &mut self,
        repo: &mut R,
        name: &str,
        stat: Stat,
    ) -> Result<(), RepositoryError> {
        let player_id = match self.by_name.get(name) {
            Some(id) => *id,
            None => {
                let player = repo.find_or_create_player(self.league_id, name)?;
                self.by_name.insert(name.to_string(), player.id);
                if !self.by_player.contains_key(&player.id) {
                    self.by_player.insert(player.id, self.lines.len());
                    self.lines.push(StatLine::new(
                        self.game_id,
                        player.id,
                        player.name,
                        self.stat_values,
                    ));
                }
                player.id
            }
        };

        let idx = self.by_player[&player_id];
        self.lines[idx].count(stat);
        Ok(())
    }

    pub fn line(&self, name: &str) -> Option<&StatLine> {
        self.by_name
            .get(name)
            .and_then(|id| self.by_player.get(id))
            .map(|&idx| &self.lines[idx])
    }

    pub fn lines(&self) -> &[StatLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<StatLine> {
        self.lines
    }
}

// ---------------------------------------------------------------------------
// Point processor
// ---------------------------------------------------------------------------

/// Applies points to a stat sheet, materialising players through the
/// injected repository.
pub struct PointProcessor<'a, R: PlayerRepository> {
    repo: &'a mut R,
    sheet: &'a mut StatSheet,
}

impl<'a, R: PlayerRepository> PointProcessor<'a, R> {
    pub fn new(repo: &'a mut R, sheet: &'a mut StatSheet) -> Self {
        PointProcessor { repo, sheet }
    }

    pub fn process(&mut self, point: &Point) -> Result<PointOutcome, RepositoryError> {
        let report = classify_point(point);
        debug!(
            events = point.events.len(),
            credits = report.credits.len(),
            "processed point"
        );

        for credit in &report.credits {
            self.sheet.credit(&mut *self.repo, &credit.player, credit.stat)?;
        }

        Ok(report.outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPlayers;

    fn run(point: &Point) -> (StatSheet, PointOutcome) {
        let mut repo = InMemoryPlayers::new();
        let mut sheet = StatSheet::new(1, 1, StatValueVersion::V2);
        let outcome = PointProcessor::new(&mut repo, &mut sheet)
            .process(point)
            .unwrap();
        (sheet, outcome)
    }

    fn stat(sheet: &StatSheet, name: &str, stat: Stat) -> u32 {
        sheet.line(name).map(|l| l.get(stat)).unwrap_or(0)
    }

    #[test]
    fn full_scoring_sequence() {
        let point = Point::new(
            &["B", "C", "D"],
            &["A"],
            vec![
                Event::pull("A"),
                Event::pass("B", "C"),
                Event::pass("C", "D"),
                Event::point("D"),
            ],
        );
        let (sheet, outcome) = run(&point);

        assert_eq!(stat(&sheet, "A", Stat::Pulls), 1);
        assert_eq!(stat(&sheet, "B", Stat::Completions), 1);
        assert_eq!(stat(&sheet, "C", Stat::Catches), 1);
        assert_eq!(stat(&sheet, "C", Stat::Completions), 1);
        assert_eq!(stat(&sheet, "D", Stat::Catches), 1);
        assert_eq!(stat(&sheet, "D", Stat::Goals), 1);
        assert_eq!(stat(&sheet, "C", Stat::Assists), 1);
        assert_eq!(stat(&sheet, "B", Stat::SecondAssists), 1);
        for name in ["B", "C", "D"] {
            assert_eq!(stat(&sheet, name, Stat::OPointsFor), 1);
        }
        assert_eq!(stat(&sheet, "A", Stat::DPointsAgainst), 1);
        assert_eq!(
            outcome,
            PointOutcome::Scored {
                scorer: "D".into(),
                by_offense: true
            }
        );
    }

    #[test]
    fn pass_then_drop_is_not_a_completion() {
        let point = Point::new(
            &["B", "C"],
            &["A"],
            vec![Event::pull("A"), Event::pass("B", "C"), Event::drop("C")],
        );
        let (sheet, outcome) = run(&point);

        assert_eq!(stat(&sheet, "B", Stat::Completions), 0);
        assert_eq!(stat(&sheet, "C", Stat::Catches), 0);
        assert_eq!(stat(&sheet, "C", Stat::Drops), 1);
        assert_eq!(stat(&sheet, "B", Stat::ThrewDrops), 1);
        assert_eq!(outcome, PointOutcome::Incomplete);
    }

    #[test]
    fn defense_then_goal_by_same_player_is_a_callahan() {
        let point = Point::new(
            &["B", "C"],
            &["A"],
            vec![Event::pull("A"), Event::defense("A"), Event::point("A")],
        );
        let (sheet, outcome) = run(&point);

        assert_eq!(stat(&sheet, "A", Stat::Callahan), 1);
        assert_eq!(stat(&sheet, "A", Stat::Goals), 1);
        assert_eq!(stat(&sheet, "A", Stat::DBlocks), 1);
        for line in sheet.lines() {
            assert_eq!(line.get(Stat::Assists), 0);
            assert_eq!(line.get(Stat::SecondAssists), 0);
        }
        assert_eq!(stat(&sheet, "A", Stat::DPointsFor), 1);
        assert_eq!(stat(&sheet, "B", Stat::OPointsAgainst), 1);
        assert_eq!(
            outcome,
            PointOutcome::Scored {
                scorer: "A".into(),
                by_offense: false
            }
        );
    }

    #[test]
    fn drop_then_goal_is_a_callahan() {
        let point = Point::new(
            &["B", "C"],
            &["A"],
            vec![Event::pass("B", "C"), Event::drop("C"), Event::point("A")],
        );
        let (sheet, _) = run(&point);
        assert_eq!(stat(&sheet, "A", Stat::Callahan), 1);
    }

    #[test]
    fn pass_to_someone_else_gives_no_assist_and_no_callahan() {
        let point = Point::new(
            &["B", "C", "D"],
            &["A"],
            vec![Event::pass("B", "C"), Event::point("D")],
        );
        let (sheet, _) = run(&point);
        assert_eq!(stat(&sheet, "B", Stat::Assists), 0);
        assert_eq!(stat(&sheet, "D", Stat::Callahan), 0);
        // The pass still completed because the next event was not a drop.
        assert_eq!(stat(&sheet, "B", Stat::Completions), 1);
        assert_eq!(stat(&sheet, "C", Stat::Catches), 1);
    }

    #[test]
    fn second_assist_needs_a_pass_two_back() {
        let point = Point::new(
            &["B", "C", "D"],
            &["A"],
            vec![Event::defense("B"), Event::pass("C", "D"), Event::point("D")],
        );
        let (sheet, _) = run(&point);
        assert_eq!(stat(&sheet, "C", Stat::Assists), 1);
        assert_eq!(stat(&sheet, "B", Stat::SecondAssists), 0);
    }

    #[test]
    fn goal_as_first_event_credits_goal_and_lines_only() {
        let point = Point::new(&["B"], &["A"], vec![Event::point("B")]);
        let (sheet, _) = run(&point);
        assert_eq!(stat(&sheet, "B", Stat::Goals), 1);
        assert_eq!(stat(&sheet, "B", Stat::Callahan), 0);
        assert_eq!(stat(&sheet, "B", Stat::OPointsFor), 1);
        assert_eq!(stat(&sheet, "A", Stat::DPointsAgainst), 1);
    }

    #[test]
    fn drop_as_first_event_charges_no_thrower() {
        let point = Point::new(&["B"], &["A"], vec![Event::drop("B")]);
        let (sheet, _) = run(&point);
        assert_eq!(stat(&sheet, "B", Stat::Drops), 1);
        let threw: u32 = sheet.lines().iter().map(|l| l.get(Stat::ThrewDrops)).sum();
        assert_eq!(threw, 0);
    }

    #[test]
    fn dangling_pass_is_reported_not_credited() {
        let point = Point::new(
            &["B", "C"],
            &["A"],
            vec![Event::pull("A"), Event::pass("B", "C")],
        );
        let report = classify_point(&point);
        assert_eq!(report.dangling_pass.as_deref(), Some("B"));
        assert_eq!(report.outcome, PointOutcome::Incomplete);
        assert!(report
            .credits
            .iter()
            .all(|c| c.stat != Stat::Completions && c.stat != Stat::Catches));
    }

    #[test]
    fn every_rostered_player_gets_exactly_one_point_role() {
        let point = Point::new(
            &["B", "C", "D"],
            &["A", "E", "F"],
            vec![Event::pull("A"), Event::pass("B", "C"), Event::point("C")],
        );
        let (sheet, _) = run(&point);
        for name in ["A", "B", "C", "D", "E", "F"] {
            let line = sheet.line(name).expect("rostered player has a line");
            assert_eq!(line.points_played(), 1, "{name}");
        }
        assert_eq!(sheet.len(), 6);
    }

    #[test]
    fn players_off_the_roster_get_no_point_roles() {
        // "Z" throws a pass but is not listed on either line.
        let point = Point::new(
            &["B"],
            &["A"],
            vec![Event::pass("Z", "B"), Event::point("B")],
        );
        let (sheet, _) = run(&point);
        assert_eq!(sheet.line("Z").unwrap().points_played(), 0);
        assert_eq!(stat(&sheet, "Z", Stat::Assists), 1);
    }

    #[test]
    fn duplicate_and_overlapping_roster_names_count_once() {
        let point = Point::new(
            &["B", "B", "C"],
            &["C", "A"],
            vec![Event::pull("A"), Event::point("B")],
        );
        let (sheet, _) = run(&point);
        assert_eq!(sheet.line("B").unwrap().points_played(), 1);
        let c = sheet.line("C").unwrap();
        assert_eq!(c.points_played(), 1);
        assert_eq!(c.get(Stat::OPointsFor), 1);
        assert_eq!(c.get(Stat::DPointsAgainst), 0);
    }

    #[test]
    fn tracker_exposes_pass_in_flight() {
        let point = Point::new(&["B", "C"], &["A"], vec![]);
        let mut tracker = PointTracker::new();
        assert!(tracker.last().is_none());

        tracker.step(&Event::pass("B", "C"), &point);
        assert!(tracker.pass_in_flight());

        tracker.step(&Event::throwaway("C"), &point);
        assert!(!tracker.pass_in_flight());
        assert_eq!(tracker.prior().map(Play::actor), Some("B"));

        let report = tracker.finish();
        assert!(report.credits.contains(&Credit::new("B", Stat::Completions)));
        assert!(report.credits.contains(&Credit::new("C", Stat::ThrowAways)));
    }

    #[test]
    fn empty_point_credits_nothing() {
        let (sheet, outcome) = run(&Point::new(&["A"], &["B"], vec![]));
        assert!(sheet.is_empty());
        assert_eq!(outcome, PointOutcome::Incomplete);
    }
}
