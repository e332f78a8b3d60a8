use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tolerance on the weight total accepted when building `FactorWeights`
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Errors raised when a weight vector does not match the recognised factors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Unknown factor: {0}")]
    UnknownFactor(String),

    #[error("Missing weight for factor {0}")]
    MissingWeight(Factor),

    #[error("Weight for {factor} must be in (0, 1], got {value}")]
    InvalidWeight { factor: Factor, value: f64 },

    #[error("Weights must sum to 1.0, got {0:.4}")]
    WeightSum(f64),
}

/// Named input signal contributing to the win probability
///
/// The serialized names are the keys used in `model.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Factor {
    #[serde(rename = "Forme")]
    Form,
    #[serde(rename = "H2H")]
    HeadToHead,
    #[serde(rename = "Attaque")]
    Attack,
    #[serde(rename = "Défense")]
    Defense,
    #[serde(rename = "Domicile")]
    HomeAdvantage,
    #[serde(rename = "xG")]
    ExpectedGoals,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Form,
        Factor::HeadToHead,
        Factor::Attack,
        Factor::Defense,
        Factor::HomeAdvantage,
        Factor::ExpectedGoals,
    ];

    /// Key used in persisted records
    pub fn key(self) -> &'static str {
        match self {
            Factor::Form => "Forme",
            Factor::HeadToHead => "H2H",
            Factor::Attack => "Attaque",
            Factor::Defense => "Défense",
            Factor::HomeAdvantage => "Domicile",
            Factor::ExpectedGoals => "xG",
        }
    }

    /// Human-readable English label
    pub fn label(self) -> &'static str {
        match self {
            Factor::Form => "Form",
            Factor::HeadToHead => "HeadToHead",
            Factor::Attack => "Attack",
            Factor::Defense => "Defense",
            Factor::HomeAdvantage => "HomeAdvantage",
            Factor::ExpectedGoals => "ExpectedGoals",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Factor {
    type Err = ModelError;

    /// Accepts either the persisted key or the English label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Factor::ALL
            .into_iter()
            .find(|f| {
                f.key().eq_ignore_ascii_case(needle) || f.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ModelError::UnknownFactor(needle.to_string()))
    }
}

/// Momentum accumulator per factor (untouched factors may be absent)
pub type Velocity = BTreeMap<Factor, f64>;

/// Per-factor contribution to a probability estimate
pub type FactorBreakdown = BTreeMap<Factor, f64>;

/// Complete weight vector over the six recognised factors
///
/// Only constructed through validation, so every factor is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Factor, f64>", into = "BTreeMap<Factor, f64>")]
pub struct FactorWeights(BTreeMap<Factor, f64>);

impl FactorWeights {
    /// Build from a factor map, rejecting missing factors, out-of-range values
    /// and totals away from 1.0
    pub fn new(weights: BTreeMap<Factor, f64>) -> Result<Self, ModelError> {
        for factor in Factor::ALL {
            let value = *weights.get(&factor).ok_or(ModelError::MissingWeight(factor))?;
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(ModelError::InvalidWeight { factor, value });
            }
        }

        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ModelError::WeightSum(total));
        }

        Ok(Self(weights))
    }

    /// Build from textual factor names, failing fast on unknown names
    ///
    /// # Examples
    /// ```
    /// use matchedge::models::{Factor, FactorWeights};
    /// let weights = FactorWeights::from_named([
    ///     ("Forme", 0.25), ("H2H", 0.20), ("Attaque", 0.15),
    ///     ("Défense", 0.15), ("Domicile", 0.10), ("xG", 0.15),
    /// ]).unwrap();
    /// assert!((weights.get(Factor::Form) - 0.25).abs() < 1e-12);
    /// assert!(FactorWeights::from_named([("Luck", 1.0)]).is_err());
    /// ```
    pub fn from_named<I, S>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut weights = BTreeMap::new();
        for (name, value) in pairs {
            weights.insert(name.as_ref().parse::<Factor>()?, value);
        }
        Self::new(weights)
    }

    /// Divide every weight by the total and round to `decimals` places
    ///
    /// `raw` must hold all six factors with positive values.
    pub(crate) fn normalized(raw: BTreeMap<Factor, f64>, decimals: i32) -> Self {
        let total: f64 = raw.values().sum();
        let weights = raw
            .into_iter()
            .map(|(factor, value)| (factor, round_to(value / total, decimals)))
            .collect();
        Self(weights)
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.0.get(&factor).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.0.iter().map(|(f, w)| (*f, *w))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Factors ordered by weight, heaviest first
    pub fn ranked(&self) -> Vec<(Factor, f64)> {
        let mut ranked: Vec<(Factor, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    pub fn as_map(&self) -> &BTreeMap<Factor, f64> {
        &self.0
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Factor::Form, 0.25),
            (Factor::HeadToHead, 0.20),
            (Factor::Attack, 0.15),
            (Factor::Defense, 0.15),
            (Factor::HomeAdvantage, 0.10),
            (Factor::ExpectedGoals, 0.15),
        ]))
    }
}

impl TryFrom<BTreeMap<Factor, f64>> for FactorWeights {
    type Error = ModelError;

    fn try_from(weights: BTreeMap<Factor, f64>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<FactorWeights> for BTreeMap<Factor, f64> {
    fn from(weights: FactorWeights) -> Self {
        weights.0
    }
}

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Season statistics for one side of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub name: String,
    pub form_score: f64,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub xg: f64,
}

/// Head-to-head record from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub total: u32,
    pub home_wins: u32,
}

/// Feature snapshot consumed by the probability model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub home: TeamStats,
    pub away: TeamStats,
    pub h2h: HeadToHead,
}

/// Result of one analysis, waiting for its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub home: String,
    pub away: String,
    pub odds: f64,
    pub probability: f64,
    pub factors: FactorBreakdown,
    pub ev: f64,
    pub kelly: f64,
    pub stake: f64,
    pub snapshot: FeatureSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn match_label(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }

    pub fn is_value_bet(&self) -> bool {
        self.ev > 0.0
    }

    pub fn signal(&self) -> Signal {
        Signal::from_ev(self.ev)
    }

    /// Model probability times market odds; above 1.0 the price overpays
    pub fn confidence(&self) -> f64 {
        self.probability * self.odds
    }

    /// Factors that contributed to this prediction
    pub fn touched_factors(&self) -> Vec<Factor> {
        self.factors.keys().copied().collect()
    }
}

/// Expected value above which a value bet is reported as strong
pub const STRONG_SIGNAL_EV: f64 = 0.15;

/// Strength of the betting signal derived from expected value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// EV above [`STRONG_SIGNAL_EV`]
    Strong,
    /// Positive EV up to and including [`STRONG_SIGNAL_EV`]
    Moderate,
    NoValue,
}

impl Signal {
    pub fn from_ev(ev: f64) -> Self {
        if ev > STRONG_SIGNAL_EV {
            Signal::Strong
        } else if ev > 0.0 {
            Signal::Moderate
        } else {
            Signal::NoValue
        }
    }

    pub fn is_value(self) -> bool {
        self != Signal::NoValue
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Strong => f.write_str("strong signal"),
            Signal::Moderate => f.write_str("moderate signal"),
            Signal::NoValue => f.write_str("no value"),
        }
    }
}

/// Observed result of a predicted match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
}

impl MatchResult {
    pub fn from_success(success: bool) -> Self {
        if success {
            MatchResult::Win
        } else {
            MatchResult::Loss
        }
    }

    pub fn is_win(self) -> bool {
        self == MatchResult::Win
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Win => f.write_str("win"),
            MatchResult::Loss => f.write_str("loss"),
        }
    }
}

/// Entry in the learning history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    #[serde(rename = "match")]
    pub match_label: String,
    pub result: MatchResult,
    pub timestamp: DateTime<Utc>,
}

/// Ledger transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Win,
    Loss,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Win => "win",
            TransactionKind::Loss => "loss",
        };
        f.write_str(name)
    }
}

/// Append-only ledger entry; `amount` is signed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = FactorWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!(FactorWeights::new(weights.as_map().clone()).is_ok());
    }

    #[test]
    fn test_factor_from_str() {
        assert_eq!("Forme".parse::<Factor>().unwrap(), Factor::Form);
        assert_eq!("défense".parse::<Factor>().unwrap(), Factor::Defense);
        assert_eq!("xg".parse::<Factor>().unwrap(), Factor::ExpectedGoals);
        assert_eq!("HomeAdvantage".parse::<Factor>().unwrap(), Factor::HomeAdvantage);
        assert!(matches!(
            "Luck".parse::<Factor>(),
            Err(ModelError::UnknownFactor(_))
        ));
    }

    #[test]
    fn test_missing_weight_rejected() {
        let mut map = FactorWeights::default().as_map().clone();
        map.remove(&Factor::ExpectedGoals);
        assert_eq!(
            FactorWeights::new(map),
            Err(ModelError::MissingWeight(Factor::ExpectedGoals))
        );
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut map = FactorWeights::default().as_map().clone();
        map.insert(Factor::Form, 0.0);
        assert!(matches!(
            FactorWeights::new(map),
            Err(ModelError::InvalidWeight { factor: Factor::Form, .. })
        ));
    }

    #[test]
    fn test_weight_sum_rejected() {
        let mut map = FactorWeights::default().as_map().clone();
        map.insert(Factor::Form, 0.5);
        assert!(matches!(FactorWeights::new(map), Err(ModelError::WeightSum(_))));
    }

    #[test]
    fn test_weights_json_uses_persisted_keys() {
        let json = serde_json::to_string(&FactorWeights::default()).unwrap();
        assert!(json.contains("\"Forme\":0.25"));
        assert!(json.contains("\"Défense\":0.15"));
        assert!(json.contains("\"xG\":0.15"));
    }

    #[test]
    fn test_weights_json_with_unknown_key_fails() {
        let json = r#"{"Forme":0.25,"H2H":0.2,"Attaque":0.15,"Défense":0.15,"Domicile":0.1,"Luck":0.15}"#;
        assert!(serde_json::from_str::<FactorWeights>(json).is_err());
    }

    #[test]
    fn test_ranked_is_descending() {
        let ranked = FactorWeights::default().ranked();
        assert_eq!(ranked[0].0, Factor::Form);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(0.5, 0), 1.0);
    }

    #[test]
    fn test_transaction_without_timestamp_parses() {
        let tx: Transaction = serde_json::from_str(r#"{"type":"win","amount":12.5}"#).unwrap();
        assert_eq!(tx.kind, TransactionKind::Win);
        assert!(tx.timestamp.is_none());
    }

    #[test]
    fn test_outcome_record_uses_match_key() {
        let record = OutcomeRecord {
            match_label: "Marseille vs Lyon".to_string(),
            result: MatchResult::Loss,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"match\":\"Marseille vs Lyon\""));
        assert!(json.contains("\"result\":\"loss\""));
    }

    #[test]
    fn test_signal_boundaries() {
        assert_eq!(Signal::from_ev(0.2), Signal::Strong);
        assert_eq!(Signal::from_ev(0.1501), Signal::Strong);
        assert_eq!(Signal::from_ev(0.15), Signal::Moderate);
        assert_eq!(Signal::from_ev(0.01), Signal::Moderate);
        assert_eq!(Signal::from_ev(0.0), Signal::NoValue);
        assert_eq!(Signal::from_ev(-0.3), Signal::NoValue);
        assert!(Signal::Moderate.is_value());
        assert!(!Signal::NoValue.is_value());
    }

    #[test]
    fn test_prediction_signal_and_confidence() {
        let snapshot = FeatureSnapshot {
            home: TeamStats {
                name: "Marseille".to_string(),
                form_score: 0.6,
                goals_scored: 40,
                goals_conceded: 20,
                xg: 2.0,
            },
            away: TeamStats {
                name: "Lyon".to_string(),
                form_score: 0.5,
                goals_scored: 30,
                goals_conceded: 25,
                xg: 1.5,
            },
            h2h: HeadToHead { total: 10, home_wins: 6 },
        };
        let prediction = PredictionRecord {
            home: "Marseille".to_string(),
            away: "Lyon".to_string(),
            odds: 2.5,
            probability: 0.5,
            factors: FactorBreakdown::new(),
            ev: 0.25,
            kelly: 0.04,
            stake: 4.0,
            snapshot,
            timestamp: Utc::now(),
        };

        assert_eq!(prediction.signal(), Signal::Strong);
        assert!((prediction.confidence() - 1.25).abs() < 1e-12);
        assert_eq!(prediction.signal().is_value(), prediction.is_value_bet());
    }
}
