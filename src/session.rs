//! Application state holder
//!
//! Owns the three persisted records and the single pending prediction. It is
//! built once at startup and handed by `&mut` to every user action; each
//! mutating action writes the affected records back to the store.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::kelly::size_bet;
use crate::core::probability::estimate_probability;
use crate::core::{BankrollState, LedgerError, ModelState, WeightAdapter};
use crate::data::sampler::{MatchSource, SyntheticSampler};
use crate::data::store::{Store, StoreError};
use crate::error::{validate_odds, validate_team_name, AppError};
use crate::models::{MatchResult, PredictionRecord};
use crate::settings::Settings;

/// How the stake of a trained prediction was handled by the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Zero stake recommended, nothing to settle
    NoStake,
    Settled { pnl: f64 },
    Declined(LedgerError),
}

/// Outcome of one training call, for display
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub match_label: String,
    pub result: MatchResult,
    pub accuracy: f64,
    pub total_cycles: u64,
    pub roi: f64,
    pub balance: f64,
    pub settlement: Settlement,
    /// Whether both records were written to disk
    pub persisted: bool,
}

pub struct Session<S: MatchSource = SyntheticSampler> {
    store: Store,
    sampler: S,
    model: ModelState,
    bankroll: BankrollState,
    settings: Settings,
    pending: Option<PredictionRecord>,
}

fn load_or_default<T: Default>(result: Result<T, StoreError>, record: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) if e.is_not_found() => {
            debug!(record, "No saved record, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(record, error = %e, "Failed to load record, using defaults");
            T::default()
        }
    }
}

impl Session<SyntheticSampler> {
    /// Session over the synthetic data source
    pub fn open_synthetic(store: Store) -> Self {
        Self::open(store, SyntheticSampler::from_entropy())
    }
}

impl<S: MatchSource> Session<S> {
    /// Load all records, falling back to defaults for missing or unreadable ones
    pub fn open(store: Store, sampler: S) -> Self {
        let mut model = load_or_default(store.load_model(), "model");
        let bankroll = load_or_default(store.load_bankroll(), "bankroll");
        let mut settings = load_or_default(store.load_settings(), "settings");

        if let Err(e) = settings.validate() {
            warn!(error = %e, "Saved settings out of range, using defaults");
            settings = Settings::default();
        }

        let accuracy = model.computed_accuracy();
        if model.accuracy != accuracy {
            warn!(
                stored = model.accuracy,
                accuracy, "Saved accuracy disagrees with history, recomputing"
            );
            model.accuracy = accuracy;
        }

        info!(dir = ?store.dir(), cycles = model.total_cycles, "Session opened");

        Self {
            store,
            sampler,
            model,
            bankroll,
            settings,
            pending: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn model(&self) -> &ModelState {
        &self.model
    }

    pub fn bankroll(&self) -> &BankrollState {
        &self.bankroll
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pending(&self) -> Option<&PredictionRecord> {
        self.pending.as_ref()
    }

    /// Drop the pending prediction without training on it
    pub fn discard_pending(&mut self) -> Option<PredictionRecord> {
        self.pending.take()
    }

    /// Sample, estimate and size a bet; replaces any pending prediction
    pub fn analyze(&mut self, home: &str, away: &str, odds: f64) -> Result<&PredictionRecord, AppError> {
        let home = validate_team_name(home)?.to_string();
        let away = validate_team_name(away)?.to_string();
        let odds = validate_odds(odds)?;

        let snapshot = self.sampler.sample(&home, &away);
        let (probability, factors) = estimate_probability(&snapshot, &self.model.weights);
        let sizing = size_bet(probability, odds, self.settings.kelly_fraction);
        let stake = sizing.stake_for(self.bankroll.current_balance);

        debug!(
            home = %home,
            away = %away,
            odds,
            probability,
            ev = sizing.expected_value,
            kelly = sizing.recommended_fraction,
            stake,
            "Prediction computed"
        );

        let record = PredictionRecord {
            home,
            away,
            odds,
            probability,
            factors,
            ev: sizing.expected_value,
            kelly: sizing.recommended_fraction,
            stake,
            snapshot,
            timestamp: Utc::now(),
        };

        Ok(self.pending.insert(record))
    }

    /// Feed the observed outcome of the pending prediction back into the
    /// model and the ledger
    pub fn train(&mut self, success: bool) -> Result<TrainingReport, AppError> {
        let prediction = self.pending.take().ok_or(AppError::NoPendingPrediction)?;
        let adapter = WeightAdapter::new(self.settings.learning_rate);
        let match_label = prediction.match_label();

        self.model.record_outcome(
            &adapter,
            match_label.clone(),
            success,
            &prediction.touched_factors(),
            prediction.timestamp,
        );

        let settlement = if prediction.stake > 0.0 {
            match self
                .bankroll
                .settle_bet(prediction.stake, prediction.odds, success)
            {
                Ok(pnl) => Settlement::Settled { pnl },
                Err(e) => {
                    warn!(error = %e, stake = prediction.stake, "Bet not settled");
                    Settlement::Declined(e)
                }
            }
        } else {
            Settlement::NoStake
        };

        let model_saved = self.persist_model();
        let bankroll_saved = self.persist_bankroll();

        Ok(TrainingReport {
            match_label,
            result: MatchResult::from_success(success),
            accuracy: self.model.accuracy,
            total_cycles: self.model.total_cycles,
            roi: self.bankroll.roi,
            balance: self.bankroll.current_balance,
            settlement,
            persisted: model_saved && bankroll_saved,
        })
    }

    /// # Returns
    /// Whether the ledger was written to disk
    pub fn deposit(&mut self, amount: f64) -> Result<bool, AppError> {
        self.bankroll.deposit(amount)?;
        Ok(self.persist_bankroll())
    }

    /// # Returns
    /// Whether the ledger was written to disk
    pub fn withdraw(&mut self, amount: f64) -> Result<bool, AppError> {
        self.bankroll.withdraw(amount)?;
        Ok(self.persist_bankroll())
    }

    /// Replace the settings after validation
    pub fn update_settings(&mut self, settings: Settings) -> Result<bool, AppError> {
        settings.validate()?;
        self.settings = settings;
        info!(settings = ?self.settings, "Settings updated");
        Ok(self.persist_settings())
    }

    /// Restore model and ledger defaults; settings are kept
    pub fn reset(&mut self) -> bool {
        self.model = ModelState::default();
        self.bankroll.reset();
        self.pending = None;
        info!("Model and bankroll reset");

        let model_saved = self.persist_model();
        let bankroll_saved = self.persist_bankroll();
        model_saved && bankroll_saved
    }

    fn persist_model(&self) -> bool {
        report_save(self.store.save_model(&self.model), "model")
    }

    fn persist_bankroll(&self) -> bool {
        report_save(self.store.save_bankroll(&self.bankroll), "bankroll")
    }

    fn persist_settings(&self) -> bool {
        report_save(self.store.save_settings(&self.settings), "settings")
    }
}

fn report_save(result: Result<(), StoreError>, record: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(record, error = %e, "Failed to save record");
            false
        }
    }
}
