//! MatchEdge - sports match value-bet assistant
//!
//! This library provides:
//! - Win probability estimation from six weighted match factors
//! - Expected value and fractional Kelly stake sizing
//! - Online factor-weight adaptation from win/loss feedback
//! - A bankroll ledger with transaction history
//! - JSON persistence of the model, bankroll and settings records
//! - A synthetic simulation of the full stake and learn loop
//!
//! # Example
//!
//! ```no_run
//! use matchedge::data::{Store, SyntheticSampler};
//! use matchedge::session::Session;
//!
//! let store = Store::open_default().expect("data directory");
//! let mut session = Session::open(store, SyntheticSampler::from_entropy());
//!
//! session.deposit(100.0).expect("valid amount");
//! let prediction = session.analyze("Marseille", "Lyon", 2.10).expect("valid input");
//! println!("p = {:.1}%, stake = {:.2}", prediction.probability * 100.0, prediction.stake);
//!
//! let report = session.train(true).expect("pending prediction");
//! println!("accuracy = {:.1}%", report.accuracy * 100.0);
//! ```

pub mod backtesting;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use crate::core::{BankrollState, ModelState, WeightAdapter};
pub use error::AppError;
pub use models::{
    Factor, FactorWeights, FeatureSnapshot, MatchResult, PredictionRecord, Signal, Transaction,
    TransactionKind,
};
pub use session::{Session, Settlement, TrainingReport};
pub use settings::{Settings, Theme};
