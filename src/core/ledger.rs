//! Bankroll ledger
//!
//! Tracks the balance, cumulative betting totals and an append-only
//! transaction log. Bets are settled at outcome time: nothing is escrowed
//! when a prediction is made, and a losing stake is debited when the loss is
//! recorded. The ledger opens at zero, so at all times
//!
//! ```text
//! current_balance == Σ transaction.amount
//! ```
//!
//! and `initial_balance` records the opening deposit for profit reporting.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{Transaction, TransactionKind};

/// Tolerance used when reconciling the balance against the transaction log
const RECONCILE_TOLERANCE: f64 = 1e-6;

/// Reasons a ledger operation is declined
///
/// A declined operation never mutates the ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Amount must be a positive number, got {0}")]
    NonPositiveAmount(f64),

    #[error("Insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Odds must be greater than 1.0, got {0}")]
    InvalidOdds(f64),
}

/// Financial state persisted in `bankroll.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    #[serde(default)]
    pub initial_balance: f64,
    #[serde(default)]
    pub current_balance: f64,
    #[serde(default)]
    pub total_wagered: f64,
    #[serde(default)]
    pub total_won: f64,
    #[serde(default)]
    pub total_lost: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub roi: f64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub total_bets: u64,
}

impl Default for BankrollState {
    fn default() -> Self {
        Self {
            initial_balance: 0.0,
            current_balance: 0.0,
            total_wagered: 0.0,
            total_won: 0.0,
            total_lost: 0.0,
            transactions: Vec::new(),
            roi: 0.0,
            win_rate: 0.0,
            total_bets: 0,
        }
    }
}

fn require_positive(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

impl BankrollState {
    /// Add funds; the first deposit on an empty ledger sets `initial_balance`
    pub fn deposit(&mut self, amount: f64) -> Result<(), LedgerError> {
        require_positive(amount)?;

        self.current_balance += amount;
        if self.initial_balance == 0.0 {
            self.initial_balance = amount;
        }
        self.push(TransactionKind::Deposit, amount);

        info!(amount, balance = self.current_balance, "Deposit recorded");
        Ok(())
    }

    /// Remove funds; declined when the amount exceeds the balance
    pub fn withdraw(&mut self, amount: f64) -> Result<(), LedgerError> {
        require_positive(amount)?;
        if amount > self.current_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.current_balance,
            });
        }

        self.current_balance -= amount;
        self.push(TransactionKind::Withdrawal, -amount);

        info!(amount, balance = self.current_balance, "Withdrawal recorded");
        Ok(())
    }

    /// Settle a bet at outcome time
    ///
    /// # Returns
    /// Profit or loss applied to the balance
    pub fn settle_bet(&mut self, stake: f64, odds: f64, success: bool) -> Result<f64, LedgerError> {
        require_positive(stake)?;
        if !odds.is_finite() || odds <= 1.0 {
            return Err(LedgerError::InvalidOdds(odds));
        }
        if stake > self.current_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: stake,
                available: self.current_balance,
            });
        }

        let pnl = if success {
            let gain = stake * odds - stake;
            self.current_balance += gain;
            self.total_won += gain;
            self.push(TransactionKind::Win, gain);
            gain
        } else {
            self.current_balance -= stake;
            self.total_lost += stake;
            self.push(TransactionKind::Loss, -stake);
            -stake
        };

        self.total_bets += 1;
        self.total_wagered += stake;
        self.recompute_rates();

        info!(
            stake,
            odds,
            success,
            pnl,
            balance = self.current_balance,
            "Bet settled"
        );
        Ok(pnl)
    }

    /// Replace the whole ledger with defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Net change since the opening deposit
    pub fn profit(&self) -> f64 {
        self.current_balance - self.initial_balance
    }

    pub fn transactions_total(&self) -> f64 {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    /// Whether the balance matches the transaction log
    pub fn reconciles(&self) -> bool {
        (self.current_balance - self.transactions_total()).abs() < RECONCILE_TOLERANCE
    }

    pub fn wins(&self) -> usize {
        self.count(TransactionKind::Win)
    }

    pub fn losses(&self) -> usize {
        self.count(TransactionKind::Loss)
    }

    /// Latest transactions, newest first
    pub fn recent_transactions(&self, limit: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().rev().take(limit)
    }

    fn count(&self, kind: TransactionKind) -> usize {
        self.transactions.iter().filter(|tx| tx.kind == kind).count()
    }

    fn push(&mut self, kind: TransactionKind, amount: f64) {
        self.transactions.push(Transaction {
            kind,
            amount,
            timestamp: Some(Utc::now()),
        });
    }

    fn recompute_rates(&mut self) {
        if self.total_wagered > 0.0 {
            self.roi = (self.total_won - self.total_lost) / self.total_wagered * 100.0;
        }

        let wins = self.wins();
        let settled = wins + self.losses();
        if settled > 0 {
            self.win_rate = wins as f64 / settled as f64 * 100.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn funded(amount: f64) -> BankrollState {
        let mut ledger = BankrollState::default();
        ledger.deposit(amount).unwrap();
        ledger
    }

    #[test]
    fn test_deposit_deposit_withdraw() {
        let mut ledger = BankrollState::default();
        ledger.deposit(100.0).unwrap();
        ledger.deposit(50.0).unwrap();
        ledger.withdraw(30.0).unwrap();

        assert!((ledger.current_balance - 120.0).abs() < 1e-9);
        assert_eq!(ledger.initial_balance, 100.0);
        assert_eq!(ledger.transactions.len(), 3);
        assert_eq!(ledger.transactions[2].kind, TransactionKind::Withdrawal);
        assert_eq!(ledger.transactions[2].amount, -30.0);
        assert!(ledger.reconciles());
        assert!((ledger.profit() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_deposit_rejects_non_positive() {
        let mut ledger = BankrollState::default();
        assert_eq!(ledger.deposit(0.0), Err(LedgerError::NonPositiveAmount(0.0)));
        assert!(ledger.deposit(-5.0).is_err());
        assert!(ledger.deposit(f64::NAN).is_err());
        assert_eq!(ledger, BankrollState::default());
    }

    #[test]
    fn test_withdraw_more_than_balance_is_noop() {
        let mut ledger = funded(50.0);
        let before = ledger.clone();

        let result = ledger.withdraw(80.0);
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_withdraw_non_positive_is_noop() {
        let mut ledger = funded(50.0);
        let before = ledger.clone();
        assert!(ledger.withdraw(0.0).is_err());
        assert!(ledger.withdraw(-10.0).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_settle_win() {
        let mut ledger = funded(100.0);
        let pnl = ledger.settle_bet(10.0, 2.5, true).unwrap();

        assert!((pnl - 15.0).abs() < 1e-9);
        assert!((ledger.current_balance - 115.0).abs() < 1e-9);
        assert!((ledger.total_won - 15.0).abs() < 1e-9);
        assert_eq!(ledger.total_bets, 1);
        assert_eq!(ledger.total_wagered, 10.0);
        assert!((ledger.roi - 150.0).abs() < 1e-9);
        assert_eq!(ledger.win_rate, 100.0);
        assert!(ledger.reconciles());
    }

    #[test]
    fn test_settle_loss_debits_stake() {
        let mut ledger = funded(100.0);
        let pnl = ledger.settle_bet(10.0, 2.5, false).unwrap();

        assert_eq!(pnl, -10.0);
        assert!((ledger.current_balance - 90.0).abs() < 1e-9);
        assert_eq!(ledger.total_lost, 10.0);
        assert_eq!(ledger.roi, -100.0);
        assert_eq!(ledger.win_rate, 0.0);
        assert!(ledger.reconciles());
    }

    #[test]
    fn test_roi_and_balance_share_a_base() {
        let mut ledger = funded(200.0);
        ledger.settle_bet(20.0, 2.0, true).unwrap();
        ledger.settle_bet(10.0, 3.0, false).unwrap();
        ledger.settle_bet(5.0, 1.5, true).unwrap();

        let net = ledger.total_won - ledger.total_lost;
        assert!((ledger.profit() - net).abs() < 1e-9);
        assert!((ledger.roi - net / 35.0 * 100.0).abs() < 1e-9);
        assert!((ledger.win_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(ledger.wins(), 2);
        assert_eq!(ledger.losses(), 1);
    }

    #[test]
    fn test_settle_rejections_are_noops() {
        let mut ledger = funded(10.0);
        let before = ledger.clone();

        assert!(ledger.settle_bet(0.0, 2.0, true).is_err());
        assert_eq!(ledger.settle_bet(5.0, 1.0, true), Err(LedgerError::InvalidOdds(1.0)));
        assert!(matches!(
            ledger.settle_bet(50.0, 2.0, false),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_balance_reconciles_after_mixed_sequence() {
        let mut ledger = BankrollState::default();
        ledger.deposit(500.0).unwrap();
        ledger.settle_bet(25.0, 1.8, true).unwrap();
        ledger.withdraw(120.5).unwrap();
        let _ = ledger.withdraw(10_000.0);
        ledger.settle_bet(40.0, 2.2, false).unwrap();
        ledger.deposit(33.3).unwrap();
        ledger.settle_bet(12.0, 4.0, true).unwrap();

        assert!(ledger.reconciles());
        assert_eq!(ledger.initial_balance, 500.0);
    }

    #[test]
    fn test_initial_balance_set_after_reset() {
        let mut ledger = funded(100.0);
        ledger.reset();
        assert_eq!(ledger, BankrollState::default());

        ledger.deposit(40.0).unwrap();
        assert_eq!(ledger.initial_balance, 40.0);
    }

    #[test]
    fn test_recent_transactions_newest_first() {
        let mut ledger = funded(100.0);
        ledger.withdraw(10.0).unwrap();
        ledger.deposit(5.0).unwrap();

        let kinds: Vec<TransactionKind> = ledger.recent_transactions(2).map(|tx| tx.kind).collect();
        assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdrawal]);
    }

    #[test]
    fn test_random_operations_reconcile() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut ledger = BankrollState::default();
        let amounts = [-10.0, 0.0, f64::NAN, f64::INFINITY];

        for _ in 0..500 {
            let before = ledger.clone();
            let amount = if rng.gen_bool(0.1) {
                amounts[rng.gen_range(0..amounts.len())]
            } else {
                rng.gen_range(0.5..400.0)
            };

            let result = match rng.gen_range(0..3) {
                0 => ledger.deposit(amount).map(|_| amount),
                1 => ledger.withdraw(amount).map(|_| -amount),
                _ => {
                    let odds = if rng.gen_bool(0.1) { 1.0 } else { rng.gen_range(1.05..6.0) };
                    ledger.settle_bet(amount, odds, rng.gen_bool(0.5))
                }
            };

            match result {
                Ok(change) => {
                    let expected = before.current_balance + change;
                    assert!((ledger.current_balance - expected).abs() < 1e-6);
                    assert_eq!(ledger.transactions.len(), before.transactions.len() + 1);
                }
                Err(_) => assert_eq!(ledger, before),
            }

            assert!(ledger.reconciles(), "balance {}", ledger.current_balance);
            assert!(ledger.current_balance >= -1e-9);
        }

        assert_eq!(ledger.total_bets as usize, ledger.wins() + ledger.losses());
    }
}
