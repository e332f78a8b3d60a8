//! Simulation Metrics
//!
//! Calculate metrics such as ROI, hit rate, drawdown, etc.

use super::simulator::RoundRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Simulation evaluation metrics, over rounds that carried a stake
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    // Basic metrics
    pub total_bets: usize,
    pub winning_bets: usize,
    pub hit_rate: f64,
    pub roi: f64,

    // Expected value related
    pub avg_ev: f64,
    pub avg_odds: f64,
    pub avg_probability: f64,

    // Risk metrics
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,

    // Win/Loss
    pub total_stake: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
}

fn settled(rounds: &[RoundRecord]) -> impl Iterator<Item = &RoundRecord> {
    rounds.iter().filter(|r| r.stake > 0.0)
}

/// Calculate metrics from round records
///
/// Drawdown is measured on cumulative profit and expressed as a share of the
/// starting bankroll.
pub fn calculate_metrics(rounds: &[RoundRecord], starting_bankroll: f64) -> SimulationMetrics {
    let bets: Vec<&RoundRecord> = settled(rounds).collect();
    if bets.is_empty() {
        return SimulationMetrics::default();
    }

    let total_bets = bets.len();
    let n = total_bets as f64;
    let winning_bets = bets.iter().filter(|b| b.won).count();
    let hit_rate = winning_bets as f64 / n;

    let avg_ev = bets.iter().map(|b| b.expected_value).sum::<f64>() / n;
    let avg_odds = bets.iter().map(|b| b.odds).sum::<f64>() / n;
    let avg_probability = bets.iter().map(|b| b.probability).sum::<f64>() / n;

    let total_stake: f64 = bets.iter().map(|b| b.stake).sum();
    let gross_profit: f64 = bets.iter().map(|b| b.profit).filter(|p| *p > 0.0).sum();
    let gross_loss: f64 = bets
        .iter()
        .map(|b| b.profit)
        .filter(|p| *p < 0.0)
        .map(f64::abs)
        .sum();
    let net_profit = gross_profit - gross_loss;

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    // Drawdown on the cumulative profit curve, starting flat
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;
    for bet in &bets {
        cumulative += bet.profit;
        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    let max_drawdown_pct = if starting_bankroll > 0.0 {
        max_drawdown / starting_bankroll
    } else {
        0.0
    };

    let roi = if total_stake > 0.0 {
        net_profit / total_stake
    } else {
        0.0
    };

    SimulationMetrics {
        total_bets,
        winning_bets,
        hit_rate,
        roi,
        avg_ev,
        avg_odds,
        avg_probability,
        profit_factor,
        max_drawdown,
        max_drawdown_pct,
        total_stake,
        gross_profit,
        gross_loss,
        net_profit,
    }
}

/// Sharpe ratio of per-bet returns (profit / stake)
pub fn calculate_sharpe_ratio(rounds: &[RoundRecord], risk_free_rate: f64) -> f64 {
    let returns: Vec<f64> = settled(rounds).map(|b| b.profit / b.stake).collect();
    if returns.is_empty() {
        return 0.0;
    }

    let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;

    let std_return = variance.sqrt();
    if std_return == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_return
}

/// Results for one bucket of bets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsBucket {
    pub key: String,
    pub bets: usize,
    pub wins: usize,
    pub hit_rate: f64,
    pub stake: f64,
    pub profit: f64,
    pub roi: f64,
}

fn odds_bucket(odds: f64) -> &'static str {
    if odds < 2.0 {
        "favourite (<2)"
    } else if odds < 3.0 {
        "balanced (2-3)"
    } else {
        "outsider (>=3)"
    }
}

/// Analyze settled bets by odds range
pub fn analyze_by_odds_range(rounds: &[RoundRecord]) -> Vec<OddsBucket> {
    let mut grouped: BTreeMap<&str, Vec<&RoundRecord>> = BTreeMap::new();
    for bet in settled(rounds) {
        grouped.entry(odds_bucket(bet.odds)).or_default().push(bet);
    }

    grouped
        .into_iter()
        .map(|(key, group)| {
            let bets = group.len();
            let wins = group.iter().filter(|b| b.won).count();
            let stake: f64 = group.iter().map(|b| b.stake).sum();
            let profit: f64 = group.iter().map(|b| b.profit).sum();

            OddsBucket {
                key: key.to_string(),
                bets,
                wins,
                hit_rate: wins as f64 / bets as f64,
                stake,
                profit,
                roi: if stake > 0.0 { profit / stake } else { 0.0 },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(odds: f64, stake: f64, won: bool) -> RoundRecord {
        let profit = if won { stake * odds - stake } else { -stake };
        RoundRecord {
            round: 0,
            home: "Marseille".to_string(),
            away: "Lyon".to_string(),
            probability: 0.5,
            odds,
            expected_value: 0.5 * odds - 1.0,
            stake,
            won,
            profit,
            balance_after: 0.0,
        }
    }

    fn create_test_rounds() -> Vec<RoundRecord> {
        vec![
            round(2.0, 10.0, true),   // +10
            round(3.0, 10.0, false),  // -10
            round(1.5, 0.0, false),   // no stake
            round(2.5, 20.0, true),   // +30
        ]
    }

    #[test]
    fn test_calculate_metrics() {
        let metrics = calculate_metrics(&create_test_rounds(), 100.0);

        assert_eq!(metrics.total_bets, 3);
        assert_eq!(metrics.winning_bets, 2);
        assert!((metrics.hit_rate - 0.6667).abs() < 0.01);
        assert!((metrics.total_stake - 40.0).abs() < 1e-9);
        assert!((metrics.gross_profit - 40.0).abs() < 1e-9);
        assert!((metrics.gross_loss - 10.0).abs() < 1e-9);
        assert!((metrics.net_profit - 30.0).abs() < 1e-9);
        assert!((metrics.roi - 0.75).abs() < 1e-9);
        assert!((metrics.profit_factor - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_metrics_empty() {
        let metrics = calculate_metrics(&[], 100.0);
        assert_eq!(metrics, SimulationMetrics::default());

        let unstaked = vec![round(2.0, 0.0, true)];
        assert_eq!(calculate_metrics(&unstaked, 100.0).total_bets, 0);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let metrics = calculate_metrics(&[round(2.0, 10.0, true)], 100.0);
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn test_max_drawdown() {
        let rounds = vec![
            round(10.0, 10.0, true),  // +90
            round(10.0, 10.0, false), // -10
            round(10.0, 10.0, false), // -10
            round(2.0, 5.0, true),    // +5
        ];

        // Cumulative: 90, 80, 70, 75 -> peak 90, max drawdown 20
        let metrics = calculate_metrics(&rounds, 200.0);
        assert!((metrics.max_drawdown - 20.0).abs() < 1e-9);
        assert!((metrics.max_drawdown_pct - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_from_first_loss() {
        let rounds = vec![round(2.0, 10.0, false), round(2.0, 10.0, false)];
        let metrics = calculate_metrics(&rounds, 100.0);
        assert!((metrics.max_drawdown - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_sharpe_ratio() {
        // Returns: 1.0, -1.0, 1.5 -> positive mean
        let sharpe = calculate_sharpe_ratio(&create_test_rounds(), 0.0);
        assert!(sharpe > 0.0);
        assert_eq!(calculate_sharpe_ratio(&[], 0.0), 0.0);
    }

    #[test]
    fn test_analyze_by_odds_range() {
        let analysis = analyze_by_odds_range(&create_test_rounds());

        // 1.5 carried no stake, so only two buckets
        assert_eq!(analysis.len(), 2);

        let balanced = analysis.iter().find(|a| a.key == "balanced (2-3)").unwrap();
        assert_eq!(balanced.bets, 2);
        assert_eq!(balanced.wins, 2);

        let outsider = analysis.iter().find(|a| a.key == "outsider (>=3)").unwrap();
        assert_eq!(outsider.bets, 1);
        assert!((outsider.roi + 1.0).abs() < 1e-9);
    }
}
