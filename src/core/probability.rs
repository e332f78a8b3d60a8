//! Weighted-factor win probability
//!
//! Each factor produces a raw signal in [0, 1] from the feature snapshot; the
//! probability is the weighted sum of those signals, clamped so that no
//! outcome is ever treated as certain:
//!
//! ```text
//! p = clamp(Σ signal(f) × weight(f), 0.05, 0.95)
//! ```

use crate::models::{Factor, FactorBreakdown, FactorWeights, FeatureSnapshot};

/// Fixed home-advantage signal (not derived from data)
pub const HOME_ADVANTAGE: f64 = 0.05;
/// Lower bound of any estimate
pub const MIN_PROBABILITY: f64 = 0.05;
/// Upper bound of any estimate
pub const MAX_PROBABILITY: f64 = 0.95;

/// Raw (unweighted) signal of one factor for the home side
pub fn factor_signal(factor: Factor, snapshot: &FeatureSnapshot) -> f64 {
    let home = &snapshot.home;
    let away = &snapshot.away;
    let h2h = &snapshot.h2h;

    match factor {
        Factor::Form => home.form_score,
        Factor::HeadToHead => h2h.home_wins as f64 / h2h.total.max(1) as f64,
        Factor::Attack => {
            home.goals_scored as f64 / (home.goals_scored + away.goals_scored).max(1) as f64
        }
        Factor::Defense => {
            1.0 - home.goals_conceded as f64
                / (home.goals_conceded + away.goals_conceded).max(1) as f64
        }
        Factor::HomeAdvantage => HOME_ADVANTAGE,
        Factor::ExpectedGoals => home.xg / (home.xg + away.xg).max(1.0),
    }
}

/// Estimate the home win probability and per-factor contributions
///
/// # Examples
/// ```
/// use matchedge::core::probability::{estimate_probability, MAX_PROBABILITY, MIN_PROBABILITY};
/// use matchedge::data::sampler::{MatchSource, SyntheticSampler};
/// use matchedge::models::FactorWeights;
///
/// let snapshot = SyntheticSampler::seeded(7).sample("Marseille", "Lyon");
/// let (p, factors) = estimate_probability(&snapshot, &FactorWeights::default());
/// assert!((MIN_PROBABILITY..=MAX_PROBABILITY).contains(&p));
/// assert_eq!(factors.len(), 6);
/// ```
pub fn estimate_probability(
    snapshot: &FeatureSnapshot,
    weights: &FactorWeights,
) -> (f64, FactorBreakdown) {
    let factors: FactorBreakdown = Factor::ALL
        .into_iter()
        .map(|factor| (factor, factor_signal(factor, snapshot) * weights.get(factor)))
        .collect();

    let total: f64 = factors.values().sum();
    (clamp_probability(total), factors)
}

/// Clamp into [MIN_PROBABILITY, MAX_PROBABILITY]; NaN maps to the lower bound
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_PROBABILITY;
    }
    value.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}
