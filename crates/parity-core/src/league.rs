// League configuration: stat-value tables and salary modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::player::LeagueId;
use crate::stat_line::Stat;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A league record that cannot drive pay or salary computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeagueConfigError {
    #[error("league {league_id} has no stat value table configured")]
    MissingStatValues { league_id: LeagueId },

    #[error("league {league_id} has unknown stat value table `{value}`")]
    UnknownStatValues { league_id: LeagueId, value: String },

    #[error("league {league_id} has no salary calculation mode configured")]
    MissingSalaryCalc { league_id: LeagueId },

    #[error("league {league_id} has unknown salary calculation mode `{value}`")]
    UnknownSalaryCalc { league_id: LeagueId, value: String },
}

// ---------------------------------------------------------------------------
// Stat value tables
// ---------------------------------------------------------------------------

/// Which counting-stat -> currency table a league pays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatValueVersion {
    V1,
    V2,
}

const V1_WEIGHTS: &[(Stat, i64)] = &[
    (Stat::Goals, 10_000),
    (Stat::Assists, 10_000),
    (Stat::SecondAssists, 8_000),
    (Stat::DBlocks, 8_000),
    (Stat::ThrowAways, -5_000),
    (Stat::ThrewDrops, -2_500),
    (Stat::Drops, -5_000),
    (Stat::Completions, 1_000),
    (Stat::Catches, 1_000),
];

// v2 halves the passing weights and starts paying for points won.
const V2_WEIGHTS: &[(Stat, i64)] = &[
    (Stat::Goals, 10_000),
    (Stat::Assists, 10_000),
    (Stat::SecondAssists, 8_000),
    (Stat::DBlocks, 8_000),
    (Stat::ThrowAways, -5_000),
    (Stat::ThrewDrops, -1_000),
    (Stat::Drops, -4_000),
    (Stat::Completions, 500),
    (Stat::Catches, 500),
    (Stat::OPointsFor, 1_000),
    (Stat::DPointsFor, 2_000),
];

impl StatValueVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" => Some(StatValueVersion::V1),
            "v2" => Some(StatValueVersion::V2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatValueVersion::V1 => "v1",
            StatValueVersion::V2 => "v2",
        }
    }

    /// Signed weight per priced stat. Stats not listed are worth nothing.
    pub fn weights(&self) -> &'static [(Stat, i64)] {
        match self {
            StatValueVersion::V1 => V1_WEIGHTS,
            StatValueVersion::V2 => V2_WEIGHTS,
        }
    }

    pub fn weight(&self, stat: Stat) -> Option<i64> {
        self.weights()
            .iter()
            .find(|(s, _)| *s == stat)
            .map(|&(_, w)| w)
    }
}

impl fmt::Display for StatValueVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Salary modes
// ---------------------------------------------------------------------------

/// How a season salary is derived from stat lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryCalc {
    /// Average per-point pay projected over a fixed number of points.
    ProRate,
    /// Base salary plus every game's pay.
    Sum,
}

impl SalaryCalc {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pro_rate" => Some(SalaryCalc::ProRate),
            "sum" => Some(SalaryCalc::Sum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryCalc::ProRate => "pro_rate",
            SalaryCalc::Sum => "sum",
        }
    }
}

impl fmt::Display for SalaryCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

/// League settings as handed over by persistence: free-form strings that may
/// be missing on legacy rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRecord {
    pub id: LeagueId,
    pub name: String,
    #[serde(default)]
    pub stat_values: Option<String>,
    #[serde(default)]
    pub salary_calc: Option<String>,
    #[serde(default)]
    pub line_size: Option<u32>,
}

/// A league whose configuration has been checked and can price stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub stat_values: StatValueVersion,
    pub salary_calc: SalaryCalc,
    #[serde(default)]
    pub line_size: Option<u32>,
}

impl TryFrom<LeagueRecord> for League {
    type Error = LeagueConfigError;

    fn try_from(record: LeagueRecord) -> Result<Self, Self::Error> {
        let league_id = record.id;

        let raw_values = record
            .stat_values
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(LeagueConfigError::MissingStatValues { league_id })?;
        let stat_values = StatValueVersion::parse(raw_values).ok_or_else(|| {
            LeagueConfigError::UnknownStatValues {
                league_id,
                value: raw_values.to_string(),
            }
        })?;

        let raw_calc = record
            .salary_calc
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(LeagueConfigError::MissingSalaryCalc { league_id })?;
        let salary_calc =
            SalaryCalc::parse(raw_calc).ok_or_else(|| LeagueConfigError::UnknownSalaryCalc {
                league_id,
                value: raw_calc.to_string(),
            })?;

        Ok(League {
            id: league_id,
            name: record.name,
            stat_values,
            salary_calc,
            line_size: record.line_size,
        })
    }
}

impl From<&League> for LeagueRecord {
    fn from(league: &League) -> Self {
        LeagueRecord {
            id: league.id,
            name: league.name.clone(),
            stat_values: Some(league.stat_values.as_str().to_string()),
            salary_calc: Some(league.salary_calc.as_str().to_string()),
            line_size: league.line_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
