//! Core business logic modules

pub mod kelly;
pub mod learning;
pub mod ledger;
pub mod probability;

// Re-export commonly used types
pub use kelly::{
    calculate_kelly_fraction, expected_value, kelly_stake_fraction, size_bet, BetSizing,
    MAX_STAKE_FRACTION,
};
pub use learning::{ModelState, WeightAdapter, DEFAULT_MOMENTUM};
pub use ledger::{BankrollState, LedgerError};
pub use probability::{estimate_probability, factor_signal};
