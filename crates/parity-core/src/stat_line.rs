// Per-(game, player) counting statistics and the metrics derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::league::StatValueVersion;
use crate::player::{GameId, PlayerId};

// ---------------------------------------------------------------------------
// Stat keys
// ---------------------------------------------------------------------------

/// Every counting statistic a stat line tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Goals,
    Assists,
    SecondAssists,
    DBlocks,
    Completions,
    ThrowAways,
    ThrewDrops,
    Catches,
    Drops,
    Pulls,
    Callahan,
    OPointsFor,
    OPointsAgainst,
    DPointsFor,
    DPointsAgainst,
}

impl Stat {
    pub const ALL: [Stat; 15] = [
        Stat::Goals,
        Stat::Assists,
        Stat::SecondAssists,
        Stat::DBlocks,
        Stat::Completions,
        Stat::ThrowAways,
        Stat::ThrewDrops,
        Stat::Catches,
        Stat::Drops,
        Stat::Pulls,
        Stat::Callahan,
        Stat::OPointsFor,
        Stat::OPointsAgainst,
        Stat::DPointsFor,
        Stat::DPointsAgainst,
    ];

    /// Column / JSON key for this stat.
    pub fn name(&self) -> &'static str {
        match self {
            Stat::Goals => "goals",
            Stat::Assists => "assists",
            Stat::SecondAssists => "second_assists",
            Stat::DBlocks => "d_blocks",
            Stat::Completions => "completions",
            Stat::ThrowAways => "throw_aways",
            Stat::ThrewDrops => "threw_drops",
            Stat::Catches => "catches",
            Stat::Drops => "drops",
            Stat::Pulls => "pulls",
            Stat::Callahan => "callahan",
            Stat::OPointsFor => "o_points_for",
            Stat::OPointsAgainst => "o_points_against",
            Stat::DPointsFor => "d_points_for",
            Stat::DPointsAgainst => "d_points_against",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round to the nearest integer, ties to even. Every rounded figure the
/// league publishes (salary per point, averaged pay, projected salaries)
/// goes through here so the numbers match the historical leaderboards.
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Raw counting statistics. All start at zero and only ever go up by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatCounts {
    pub goals: u32,
    pub assists: u32,
    pub second_assists: u32,
    pub d_blocks: u32,
    pub completions: u32,
    pub throw_aways: u32,
    pub threw_drops: u32,
    pub catches: u32,
    pub drops: u32,
    pub pulls: u32,
    pub callahan: u32,
    pub o_points_for: u32,
    pub o_points_against: u32,
    pub d_points_for: u32,
    pub d_points_against: u32,
}

impl StatCounts {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Goals => self.goals,
            Stat::Assists => self.assists,
            Stat::SecondAssists => self.second_assists,
            Stat::DBlocks => self.d_blocks,
            Stat::Completions => self.completions,
            Stat::ThrowAways => self.throw_aways,
            Stat::ThrewDrops => self.threw_drops,
            Stat::Catches => self.catches,
            Stat::Drops => self.drops,
            Stat::Pulls => self.pulls,
            Stat::Callahan => self.callahan,
            Stat::OPointsFor => self.o_points_for,
            Stat::OPointsAgainst => self.o_points_against,
            Stat::DPointsFor => self.d_points_for,
            Stat::DPointsAgainst => self.d_points_against,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Goals => &mut self.goals,
            Stat::Assists => &mut self.assists,
            Stat::SecondAssists => &mut self.second_assists,
            Stat::DBlocks => &mut self.d_blocks,
            Stat::Completions => &mut self.completions,
            Stat::ThrowAways => &mut self.throw_aways,
            Stat::ThrewDrops => &mut self.threw_drops,
            Stat::Catches => &mut self.catches,
            Stat::Drops => &mut self.drops,
            Stat::Pulls => &mut self.pulls,
            Stat::Callahan => &mut self.callahan,
            Stat::OPointsFor => &mut self.o_points_for,
            Stat::OPointsAgainst => &mut self.o_points_against,
            Stat::DPointsFor => &mut self.d_points_for,
            Stat::DPointsAgainst => &mut self.d_points_against,
        }
    }

    /// Count one occurrence of `stat`.
    pub fn count(&mut self, stat: Stat) {
        *self.slot(stat) += 1;
    }

    /// Overwrite a single stat. Used when rehydrating stored rows.
    pub fn set(&mut self, stat: Stat, value: u32) {
        *self.slot(stat) = value;
    }

    /// Field-wise sum.
    pub fn add(&mut self, other: &StatCounts) {
        for stat in Stat::ALL {
            *self.slot(stat) += other.get(stat);
        }
    }

    pub fn o_points_played(&self) -> u32 {
        self.o_points_for + self.o_points_against
    }

    pub fn d_points_played(&self) -> u32 {
        self.d_points_for + self.d_points_against
    }

    pub fn points_played(&self) -> u32 {
        self.o_points_played() + self.d_points_played()
    }

    /// Weighted sum of every stat the value table prices.
    pub fn pay(&self, values: StatValueVersion) -> i64 {
        values
            .weights()
            .iter()
            .map(|&(stat, weight)| i64::from(self.get(stat)) * weight)
            .sum()
    }

    /// `pay / points_played`, rounded; zero when no points were played.
    pub fn salary_per_point(&self, values: StatValueVersion) -> i64 {
        let played = self.points_played();
        if played == 0 {
            return 0;
        }
        round_half_even(self.pay(values) as f64 / f64::from(played))
    }

    pub fn o_efficiency(&self) -> f64 {
        ratio(self.o_points_for, self.o_points_played())
    }

    pub fn d_efficiency(&self) -> f64 {
        ratio(self.d_points_for, self.d_points_played())
    }

    pub fn total_efficiency(&self) -> f64 {
        ratio(self.o_points_for + self.d_points_for, self.points_played())
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

// ---------------------------------------------------------------------------
// StatLine
// ---------------------------------------------------------------------------

/// One player's statistics for one game.
///
/// The value table version is captured when the line is computed so `pay`
/// stays reproducible even if the league later moves to another table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub stat_values: StatValueVersion,
    #[serde(flatten)]
    pub counts: StatCounts,
}

impl StatLine {
    pub fn new(
        game_id: GameId,
        player_id: PlayerId,
        player_name: impl Into<String>,
        stat_values: StatValueVersion,
    ) -> Self {
        StatLine {
            game_id,
            player_id,
            player_name: player_name.into(),
            stat_values,
            counts: StatCounts::default(),
        }
    }

    pub fn count(&mut self, stat: Stat) {
        self.counts.count(stat);
    }

    pub fn get(&self, stat: Stat) -> u32 {
        self.counts.get(stat)
    }

    pub fn points_played(&self) -> u32 {
        self.counts.points_played()
    }

    pub fn pay(&self) -> i64 {
        self.counts.pay(self.stat_values)
    }

    pub fn salary_per_point(&self) -> i64 {
        self.counts.salary_per_point(self.stat_values)
    }

    pub fn o_efficiency(&self) -> f64 {
        self.counts.o_efficiency()
    }

    pub fn d_efficiency(&self) -> f64 {
        self.counts.d_efficiency()
    }

    pub fn total_efficiency(&self) -> f64 {
        self.counts.total_efficiency()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
