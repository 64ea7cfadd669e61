// Season salary estimation.
//
// Turns a league's stat lines into one salary per rostered player. The
// league's `SalaryCalc` picks how a salary is resolved from stats; players
// left unresolved (too few qualifying games, or no games at all) receive
// their operator-entered fallback or the mean salary of their gender bucket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::UNKNOWN_TEAM;
use crate::league::SalaryCalc;
use crate::player::{GenderBucket, Player, PlayerId, Team, TeamId};
use crate::stat_line::{round_half_even, StatLine};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tunables for the salary models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalarySettings {
    /// A game counts toward `pro_rate` only when strictly more points than
    /// this were played.
    pub pro_rate_min_points: u32,
    /// Season length, in points, the per-point rate is projected over.
    pub pro_rate_points: u32,
    /// Starting salary in `sum` mode.
    pub sum_base: i64,
}

impl Default for SalarySettings {
    fn default() -> Self {
        SalarySettings {
            pro_rate_min_points: 3,
            pro_rate_points: 15,
            sum_base: 500_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Where a player's salary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalarySource {
    /// Resolved from the player's own stat lines.
    Stats,
    /// The player's `fallback_salary`.
    Fallback,
    /// Mean of resolved salaries in the player's gender bucket.
    BucketMean,
}

/// `/players` response entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSalary {
    pub name: String,
    pub team: String,
    pub salary: i64,
    #[serde(skip)]
    pub source: Option<SalarySource>,
}

/// Mean resolved salary per gender bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketMeans {
    pub open: i64,
    pub women: i64,
}

impl BucketMeans {
    /// Means over the non-zero salaries of each bucket. An empty bucket is 0.
    pub fn from_resolved<I>(resolved: I) -> Self
    where
        I: IntoIterator<Item = (GenderBucket, i64)>,
    {
        let (mut open_sum, mut open_n) = (0i64, 0i64);
        let (mut women_sum, mut women_n) = (0i64, 0i64);
        for (bucket, salary) in resolved {
            if salary == 0 {
                continue;
            }
            match bucket {
                GenderBucket::Open => {
                    open_sum += salary;
                    open_n += 1;
                }
                GenderBucket::Women => {
                    women_sum += salary;
                    women_n += 1;
                }
            }
        }
        BucketMeans {
            open: round_half_even(open_sum as f64 / open_n.max(1) as f64),
            women: round_half_even(women_sum as f64 / women_n.max(1) as f64),
        }
    }

    pub fn get(&self, bucket: GenderBucket) -> i64 {
        match bucket {
            GenderBucket::Open => self.open,
            GenderBucket::Women => self.women,
        }
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Salary model for one league.
#[derive(Debug, Clone, Copy)]
pub struct SalaryEstimator {
    calc: SalaryCalc,
    settings: SalarySettings,
}

impl SalaryEstimator {
    pub fn new(calc: SalaryCalc, settings: SalarySettings) -> Self {
        SalaryEstimator { calc, settings }
    }

    pub fn calc(&self) -> SalaryCalc {
        self.calc
    }

    /// Resolve a salary from one player's stat lines, or `None` when the
    /// lines do not support one.
    ///
    /// - `pro_rate`: mean `salary_per_point` over games with more than
    ///   `pro_rate_min_points` points played, times `pro_rate_points`.
    /// - `sum`: `sum_base` plus every game's `pay`.
    ///
    /// A player with no lines at all is unresolved in both modes.
    pub fn resolve(&self, lines: &[&StatLine]) -> Option<i64> {
        if lines.is_empty() {
            return None;
        }

        match self.calc {
            SalaryCalc::ProRate => {
                let rates: Vec<i64> = lines
                    .iter()
                    .filter(|l| l.points_played() > self.settings.pro_rate_min_points)
                    .map(|l| l.salary_per_point())
                    .collect();
                if rates.is_empty() {
                    return None;
                }
                let mean = rates.iter().sum::<i64>() as f64 / rates.len() as f64;
                Some(round_half_even(
                    mean * f64::from(self.settings.pro_rate_points),
                ))
            }
            SalaryCalc::Sum => {
                Some(self.settings.sum_base + lines.iter().map(|l| l.pay()).sum::<i64>())
            }
        }
    }

    /// Estimate a salary for every player holding a standing team, in the
    /// order given.
    ///
    /// Algorithm:
    /// 1. Resolve each rostered player from their own lines.
    /// 2. Average the non-zero resolved salaries per gender bucket.
    /// 3. Unresolved players take their non-zero `fallback_salary`, else
    ///    their bucket's mean.
    pub fn estimate(
        &self,
        players: &[Player],
        teams: &[Team],
        lines: &[StatLine],
    ) -> Vec<PlayerSalary> {
        let team_names: HashMap<TeamId, &str> =
            teams.iter().map(|t| (t.id, t.name.as_str())).collect();

        let mut by_player: HashMap<PlayerId, Vec<&StatLine>> = HashMap::new();
        for line in lines {
            by_player.entry(line.player_id).or_default().push(line);
        }

        let rostered: Vec<(&Player, Option<i64>)> = players
            .iter()
            .filter(|p| p.team_id.is_some())
            .map(|p| {
                let own = by_player.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
                (p, self.resolve(own))
            })
            .collect();

        let means = BucketMeans::from_resolved(
            rostered
                .iter()
                .filter_map(|(p, s)| s.map(|s| (GenderBucket::of(p.gender), s))),
        );
        debug!(
            calc = %self.calc,
            open_mean = means.open,
            women_mean = means.women,
            "salary bucket means"
        );

        rostered
            .into_iter()
            .map(|(player, resolved)| {
                let (salary, source) = match resolved {
                    Some(s) => (s, SalarySource::Stats),
                    None => match player.fallback_salary.filter(|&f| f != 0) {
                        Some(f) => (f, SalarySource::Fallback),
                        None => (
                            means.get(GenderBucket::of(player.gender)),
                            SalarySource::BucketMean,
                        ),
                    },
                };
                let team = player
                    .team_id
                    .and_then(|id| team_names.get(&id).copied())
                    .unwrap_or(UNKNOWN_TEAM);
                PlayerSalary {
                    name: player.name.clone(),
                    team: team.to_string(),
                    salary,
                    source: Some(source),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
