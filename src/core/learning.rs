//! Online factor-weight adaptation
//!
//! A per-factor reinforcement rule smoothed by momentum. For every factor
//! that contributed to a prediction:
//!
//! ```text
//! gradient = lr × (1 − w)   on success
//! gradient = −lr × w        on failure
//! v' = momentum × v + gradient
//! w' = max(0.01, w + v')
//! ```
//!
//! after which the whole vector is renormalised to sum to 1 and rounded to
//! four decimals. Velocity is part of the persisted model state and carries
//! over between training events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::models::{Factor, FactorWeights, MatchResult, OutcomeRecord, Velocity};

/// Default momentum coefficient
pub const DEFAULT_MOMENTUM: f64 = 0.9;
/// Floor keeping every factor recoverable
pub const MIN_WEIGHT: f64 = 0.01;
/// Decimal places kept in stored weights
pub const WEIGHT_DECIMALS: i32 = 4;

/// Momentum-smoothed weight update rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightAdapter {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl WeightAdapter {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            momentum: DEFAULT_MOMENTUM,
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Gradient for one factor given its current weight
    pub fn gradient(&self, weight: f64, success: bool) -> f64 {
        if success {
            self.learning_rate * (1.0 - weight)
        } else {
            -self.learning_rate * weight
        }
    }

    /// Nudge the touched factors and renormalise the whole vector
    ///
    /// # Examples
    /// ```
    /// use matchedge::core::learning::WeightAdapter;
    /// use matchedge::models::{Factor, FactorWeights, Velocity};
    ///
    /// let adapter = WeightAdapter::new(0.05);
    /// let (weights, velocity) = adapter.adapt(
    ///     &FactorWeights::default(),
    ///     &Velocity::new(),
    ///     true,
    ///     &[Factor::Form],
    /// );
    /// assert!((velocity[&Factor::Form] - 0.0375).abs() < 1e-12);
    /// assert!((weights.total() - 1.0).abs() < 1e-3);
    /// ```
    pub fn adapt(
        &self,
        weights: &FactorWeights,
        velocity: &Velocity,
        success: bool,
        touched: &[Factor],
    ) -> (FactorWeights, Velocity) {
        let mut raw: BTreeMap<Factor, f64> = weights.as_map().clone();
        let mut new_velocity = velocity.clone();

        for &factor in touched {
            let current = weights.get(factor);
            let previous = velocity.get(&factor).copied().unwrap_or(0.0);
            let v = self.momentum * previous + self.gradient(current, success);

            new_velocity.insert(factor, v);
            raw.insert(factor, (current + v).max(MIN_WEIGHT));
        }

        (FactorWeights::normalized(raw, WEIGHT_DECIMALS), new_velocity)
    }
}

/// Learned model state persisted in `model.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub weights: FactorWeights,
    #[serde(default)]
    pub velocity: Velocity,
    #[serde(default)]
    pub history: Vec<OutcomeRecord>,
    #[serde(default)]
    pub total_cycles: u64,
    #[serde(default)]
    pub accuracy: f64,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            velocity: Velocity::new(),
            history: Vec::new(),
            total_cycles: 0,
            accuracy: 0.0,
        }
    }
}

impl ModelState {
    /// Apply one training event
    pub fn record_outcome(
        &mut self,
        adapter: &WeightAdapter,
        match_label: impl Into<String>,
        success: bool,
        touched: &[Factor],
        timestamp: DateTime<Utc>,
    ) {
        let (weights, velocity) = adapter.adapt(&self.weights, &self.velocity, success, touched);
        self.weights = weights;
        self.velocity = velocity;
        self.total_cycles += 1;
        self.history.push(OutcomeRecord {
            match_label: match_label.into(),
            result: MatchResult::from_success(success),
            timestamp,
        });
        self.accuracy = self.computed_accuracy();

        info!(
            cycles = self.total_cycles,
            accuracy = self.accuracy,
            success,
            "Model weights updated"
        );
    }

    /// Share of winning outcomes in the history, 0 when empty
    pub fn computed_accuracy(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let wins = self.history.iter().filter(|h| h.result.is_win()).count();
        wins as f64 / self.history.len() as f64
    }

    /// Most recent outcomes, newest first
    pub fn recent_history(&self, limit: usize) -> impl Iterator<Item = &OutcomeRecord> {
        self.history.iter().rev().take(limit)
    }
}
