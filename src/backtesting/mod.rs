//! Synthetic simulation for exercising the staking and learning loop

pub mod metrics;
pub mod simulator;

pub use metrics::{analyze_by_odds_range, calculate_metrics, calculate_sharpe_ratio, SimulationMetrics};
pub use simulator::{RoundRecord, SimulationConfig, SimulationResult, Simulator};
