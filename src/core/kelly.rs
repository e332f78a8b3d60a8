//! Kelly Criterion Bet Sizing
//!
//! Edge and stake sizing from a model probability and decimal market odds.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)
//!     odds = decimal odds (e.g., 2.0 means 2x return)
//!
//! The recommended fraction is `max(0, f*) × risk_fraction`, capped at
//! [`MAX_STAKE_FRACTION`]. Converting the fraction into money is left to the
//! caller, which knows the current balance.

use serde::{Deserialize, Serialize};

/// Policy ceiling on the bankroll fraction staked on a single bet.
///
/// Applied regardless of how confident the model is.
pub const MAX_STAKE_FRACTION: f64 = 0.25;

/// Bet sizing recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetSizing {
    pub probability: f64,
    pub odds: f64,
    pub expected_value: f64,       // p * odds - 1
    pub kelly_fraction: f64,       // Full Kelly, may be negative
    pub recommended_fraction: f64, // After risk fraction and cap
}

impl BetSizing {
    /// Monetary stake for the given balance
    pub fn stake_for(&self, balance: f64) -> f64 {
        (self.recommended_fraction * balance).max(0.0)
    }
}

/// Expected value of a unit bet
///
/// Positive means the market price overpays relative to the model.
///
/// # Examples
/// ```
/// use matchedge::core::kelly::expected_value;
/// assert!((expected_value(0.6, 2.0) - 0.2).abs() < 1e-12);
/// ```
pub fn expected_value(probability: f64, odds: f64) -> f64 {
    probability * odds - 1.0
}

/// Calculate the full Kelly fraction for a single bet
///
/// # Returns
/// Kelly fraction (negative when the bet has no edge), 0 when odds ≤ 1
///
/// # Examples
/// ```
/// use matchedge::core::kelly::calculate_kelly_fraction;
/// let kelly = calculate_kelly_fraction(0.25, 5.0);
/// assert!((kelly - 0.0625).abs() < 0.0001);
/// ```
pub fn calculate_kelly_fraction(probability: f64, odds: f64) -> f64 {
    if !odds.is_finite() || odds <= 1.0 {
        return 0.0;
    }

    let b = odds - 1.0;
    let q = 1.0 - probability;
    (probability * b - q) / b
}

/// Fractional Kelly stake as a share of bankroll
///
/// Returns 0 when odds ≤ 1 and never more than [`MAX_STAKE_FRACTION`].
pub fn kelly_stake_fraction(probability: f64, odds: f64, risk_fraction: f64) -> f64 {
    if !odds.is_finite() || odds <= 1.0 {
        return 0.0;
    }

    let raw = calculate_kelly_fraction(probability, odds).max(0.0);
    let fraction = raw * risk_fraction;
    if fraction.is_nan() {
        return 0.0;
    }
    fraction.clamp(0.0, MAX_STAKE_FRACTION)
}

/// Size a single bet
pub fn size_bet(probability: f64, odds: f64, risk_fraction: f64) -> BetSizing {
    BetSizing {
        probability,
        odds,
        expected_value: expected_value(probability, odds),
        kelly_fraction: calculate_kelly_fraction(probability, odds),
        recommended_fraction: kelly_stake_fraction(probability, odds, risk_fraction),
    }
}
