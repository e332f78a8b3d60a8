//! Synthetic Simulator
//!
//! Runs the analyze, stake, settle and learn loop for many synthetic fixtures
//! on scratch model and bankroll state. Nothing here reads or writes the
//! persisted records.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info};

use super::metrics::{calculate_metrics, calculate_sharpe_ratio, SimulationMetrics};
use crate::core::kelly::size_bet;
use crate::core::probability::{clamp_probability, estimate_probability};
use crate::core::{BankrollState, ModelState, WeightAdapter};
use crate::data::sampler::{MatchSource, SyntheticSampler};
use crate::error::{validate_kelly_fraction, validate_learning_rate, AppError};
use crate::models::{Factor, FactorWeights};
use crate::settings::{DEFAULT_KELLY_FRACTION, DEFAULT_LEARNING_RATE};

/// Clubs drawn for synthetic fixtures
pub const TEAM_POOL: [&str; 8] = [
    "Marseille", "Lyon", "Lens", "Nice", "Rennes", "Lille", "Nantes", "Monaco",
];

/// One simulated fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: usize,
    pub home: String,
    pub away: String,
    pub probability: f64,
    pub odds: f64,
    pub expected_value: f64,
    /// Zero when no bet was placed
    pub stake: f64,
    pub won: bool,
    pub profit: f64,
    pub balance_after: f64,
}

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub rounds: usize,
    pub seed: u64,
    pub starting_bankroll: f64,
    pub learning_rate: f64,
    pub kelly_fraction: f64,
    /// Decimal odds are drawn uniformly from this range
    pub odds_range: Range<f64>,
    /// Half-width of the uniform error between the estimate and the
    /// probability the outcome is drawn with
    pub noise: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 200,
            seed: 42,
            starting_bankroll: 1_000.0,
            learning_rate: DEFAULT_LEARNING_RATE,
            kelly_fraction: DEFAULT_KELLY_FRACTION,
            odds_range: 1.5..3.5,
            noise: 0.05,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_learning_rate(self.learning_rate)?;
        validate_kelly_fraction(self.kelly_fraction)?;

        if !self.starting_bankroll.is_finite() || self.starting_bankroll < 0.0 {
            return Err(AppError::Validation(format!(
                "Starting bankroll must be zero or positive, got {}",
                self.starting_bankroll
            )));
        }
        if !(self.odds_range.start > 1.0 && self.odds_range.end > self.odds_range.start) {
            return Err(AppError::Validation(format!(
                "Odds range must lie above 1.0 and be non-empty, got {:?}",
                self.odds_range
            )));
        }
        if !(0.0..=0.5).contains(&self.noise) {
            return Err(AppError::Validation(format!(
                "Noise must be in [0, 0.5], got {}",
                self.noise
            )));
        }
        Ok(())
    }
}

/// Simulation result
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub rounds: Vec<RoundRecord>,
    pub starting_bankroll: f64,
    pub bankroll: BankrollState,
    pub model: ModelState,
    /// Weights after each round
    pub weight_trajectory: Vec<FactorWeights>,
    pub metrics: SimulationMetrics,
}

impl SimulationResult {
    pub fn final_balance(&self) -> f64 {
        self.bankroll.current_balance
    }

    pub fn total_profit(&self) -> f64 {
        self.final_balance() - self.starting_bankroll
    }

    pub fn bets_placed(&self) -> usize {
        self.rounds.iter().filter(|r| r.stake > 0.0).count()
    }
}

/// Synthetic simulator
pub struct Simulator {
    pub config: SimulationConfig,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run every round from fresh default state
    pub fn run(&self) -> Result<SimulationResult, AppError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sampler = SyntheticSampler::seeded(self.config.seed.wrapping_add(1));
        let adapter = WeightAdapter::new(self.config.learning_rate);

        let mut model = ModelState::default();
        let mut bankroll = BankrollState::default();
        if self.config.starting_bankroll > 0.0 {
            bankroll.deposit(self.config.starting_bankroll)?;
        }

        let mut rounds = Vec::with_capacity(self.config.rounds);
        let mut weight_trajectory = Vec::with_capacity(self.config.rounds);

        for round in 1..=self.config.rounds {
            let (home, away) = pick_fixture(&mut rng);
            let odds = rng.gen_range(self.config.odds_range.clone());

            let snapshot = sampler.sample(home, away);
            let (probability, _) = estimate_probability(&snapshot, &model.weights);
            let sizing = size_bet(probability, odds, self.config.kelly_fraction);
            let stake = sizing.stake_for(bankroll.current_balance);

            let noise = self.config.noise;
            let true_probability = clamp_probability(probability + rng.gen_range(-noise..=noise));
            let won = rng.gen::<f64>() < true_probability;

            let (stake, profit) = if stake > 0.0 {
                match bankroll.settle_bet(stake, odds, won) {
                    Ok(pnl) => (stake, pnl),
                    Err(e) => {
                        debug!(round, error = %e, "Simulated bet skipped");
                        (0.0, 0.0)
                    }
                }
            } else {
                (0.0, 0.0)
            };

            model.record_outcome(
                &adapter,
                format!("{} vs {}", home, away),
                won,
                &Factor::ALL,
                Utc::now(),
            );
            weight_trajectory.push(model.weights.clone());

            rounds.push(RoundRecord {
                round,
                home: home.to_string(),
                away: away.to_string(),
                probability,
                odds,
                expected_value: sizing.expected_value,
                stake,
                won,
                profit,
                balance_after: bankroll.current_balance,
            });
        }

        let metrics = calculate_metrics(&rounds, self.config.starting_bankroll);
        info!(
            rounds = self.config.rounds,
            bets = metrics.total_bets,
            roi = metrics.roi,
            "Simulation finished"
        );

        Ok(SimulationResult {
            rounds,
            starting_bankroll: self.config.starting_bankroll,
            bankroll,
            model,
            weight_trajectory,
            metrics,
        })
    }

    /// Print summary of simulation result
    pub fn print_summary(&self, result: &SimulationResult) {
        println!("\n{}", "=".repeat(60));
        println!("SIMULATION RESULTS");
        println!("{}", "=".repeat(60));
        println!("Rounds: {}", self.config.rounds);
        println!("Seed: {}", self.config.seed);
        println!("Learning rate: {:.3}", self.config.learning_rate);
        println!("Kelly fraction: {:.2}", self.config.kelly_fraction);
        println!(
            "Odds range: {:.2} - {:.2}",
            self.config.odds_range.start, self.config.odds_range.end
        );
        println!("{}", "-".repeat(60));
        println!("Bets placed: {}", result.bets_placed());
        println!("Winning bets: {}", result.metrics.winning_bets);
        println!("Starting bankroll: {:.2}", result.starting_bankroll);
        println!("Final bankroll: {:.2}", result.final_balance());
        println!("Total profit: {:.2}", result.total_profit());
        println!("ROI: {:.1}%", result.metrics.roi * 100.0);

        let metrics = &result.metrics;
        println!("{}", "-".repeat(60));
        println!("Hit rate: {:.1}%", metrics.hit_rate * 100.0);
        println!("Average EV: {:.3}", metrics.avg_ev);
        println!("Profit factor: {:.2}", metrics.profit_factor);
        println!(
            "Sharpe ratio: {:.2}",
            calculate_sharpe_ratio(&result.rounds, 0.0)
        );
        println!(
            "Max drawdown: {:.2} ({:.1}%)",
            metrics.max_drawdown,
            metrics.max_drawdown_pct * 100.0
        );
        println!("Model accuracy: {:.1}%", result.model.accuracy * 100.0);

        println!("{}", "-".repeat(60));
        println!("Final weights:");
        for (factor, weight) in result.model.weights.ranked() {
            println!("  {:<10} {:.4}", factor.label(), weight);
        }

        println!("{}", "=".repeat(60));
    }
}

fn pick_fixture<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    let n = TEAM_POOL.len();
    let home = rng.gen_range(0..n);
    let away = (home + rng.gen_range(1..n)) % n;
    (TEAM_POOL[home], TEAM_POOL[away])
}
