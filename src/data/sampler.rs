//! Synthetic Match Data
//!
//! Stand-in for a real data feed: draws a feature snapshot for two teams from
//! fixed uniform ranges. Any historical source can replace it by implementing
//! [`MatchSource`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::{Range, RangeInclusive};

use crate::models::{FeatureSnapshot, HeadToHead, TeamStats};

/// Source of feature snapshots for a fixture
pub trait MatchSource {
    fn sample(&mut self, home: &str, away: &str) -> FeatureSnapshot;
}

/// Sampling ranges for one side of the fixture
#[derive(Debug, Clone)]
pub struct TeamRanges {
    pub form_score: Range<f64>,
    pub goals_scored: RangeInclusive<u32>,
    pub goals_conceded: RangeInclusive<u32>,
    pub xg: Range<f64>,
}

/// Home side draws
pub const HOME_RANGES: TeamRanges = TeamRanges {
    form_score: 0.40..0.85,
    goals_scored: 20..=60,
    goals_conceded: 15..=40,
    xg: 1.2..2.5,
};

/// Away side draws
pub const AWAY_RANGES: TeamRanges = TeamRanges {
    form_score: 0.30..0.75,
    goals_scored: 15..=50,
    goals_conceded: 18..=45,
    xg: 1.0..2.0,
};

/// Number of past meetings
pub const H2H_TOTAL: RangeInclusive<u32> = 5..=20;
/// Lower bound on home wins; the upper bound is `min(H2H_MAX_HOME_WINS, total)`
pub const H2H_MIN_HOME_WINS: u32 = 2;
pub const H2H_MAX_HOME_WINS: u32 = 10;

/// Uniform random snapshot generator
pub struct SyntheticSampler<R: Rng = StdRng> {
    rng: R,
}

impl SyntheticSampler<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic sampler for tests and reproducible simulations
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SyntheticSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn team(&mut self, name: &str, ranges: &TeamRanges) -> TeamStats {
        TeamStats {
            name: name.to_string(),
            form_score: self.rng.gen_range(ranges.form_score.clone()),
            goals_scored: self.rng.gen_range(ranges.goals_scored.clone()),
            goals_conceded: self.rng.gen_range(ranges.goals_conceded.clone()),
            xg: self.rng.gen_range(ranges.xg.clone()),
        }
    }

    fn head_to_head(&mut self) -> HeadToHead {
        let total = self.rng.gen_range(H2H_TOTAL);
        let max_wins = H2H_MAX_HOME_WINS.min(total);
        HeadToHead {
            total,
            home_wins: self.rng.gen_range(H2H_MIN_HOME_WINS..=max_wins),
        }
    }
}

impl<R: Rng> MatchSource for SyntheticSampler<R> {
    fn sample(&mut self, home: &str, away: &str) -> FeatureSnapshot {
        let home = self.team(home, &HOME_RANGES);
        let away = self.team(away, &AWAY_RANGES);
        let h2h = self.head_to_head();
        FeatureSnapshot { home, away, h2h }
    }
}
