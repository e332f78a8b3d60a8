use thiserror::Error;

use crate::core::LedgerError;
use crate::models::ModelError;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid user input; nothing was mutated
    #[error("Validation error: {0}")]
    Validation(String),

    /// Weight vector does not match the recognised factors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Ledger operation declined
    #[error("Ledger declined: {0}")]
    Ledger(#[from] LedgerError),

    /// Outcome submitted without a live prediction
    #[error("No pending prediction: run an analysis first")]
    NoPendingPrediction,
}

/// Minimum length of a team name after trimming
pub const MIN_TEAM_NAME_LEN: usize = 2;

/// Validation functions
pub fn validate_team_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_TEAM_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Team name must have at least {} characters, got '{}'",
            MIN_TEAM_NAME_LEN, trimmed
        )));
    }
    Ok(trimmed)
}

pub fn validate_odds(odds: f64) -> Result<f64, AppError> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(AppError::Validation(format!(
            "Odds must be a number greater than 1.0, got {}",
            odds
        )));
    }
    Ok(odds)
}

/// Parse decimal odds typed by the user ("2.10" or "2,10")
pub fn parse_odds(text: &str) -> Result<f64, AppError> {
    let normalized = text.trim().replace(',', ".");
    let odds: f64 = normalized
        .parse()
        .map_err(|_| AppError::Validation(format!("Odds must be numeric, got '{}'", text.trim())))?;
    validate_odds(odds)
}

pub fn validate_learning_rate(rate: f64) -> Result<f64, AppError> {
    if !(rate > 0.0 && rate < 1.0) {
        return Err(AppError::Validation(format!(
            "Learning rate must be in (0, 1), got {}",
            rate
        )));
    }
    Ok(rate)
}

pub fn validate_kelly_fraction(fraction: f64) -> Result<f64, AppError> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(AppError::Validation(format!(
            "Kelly fraction must be in (0, 1], got {}",
            fraction
        )));
    }
    Ok(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_team_name_valid() {
        assert_eq!(validate_team_name("  Lyon ").unwrap(), "Lyon");
        assert!(validate_team_name("OM").is_ok());
    }

    #[test]
    fn test_validate_team_name_invalid() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name("X").is_err());
    }

    #[test]
    fn test_validate_odds_valid() {
        assert!(validate_odds(1.01).is_ok());
        assert!(validate_odds(2.0).is_ok());
        assert!(validate_odds(100.0).is_ok());
    }

    #[test]
    fn test_validate_odds_invalid() {
        assert!(validate_odds(1.0).is_err());
        assert!(validate_odds(0.5).is_err());
        assert!(validate_odds(-1.0).is_err());
        assert!(validate_odds(f64::INFINITY).is_err());
        assert!(validate_odds(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_odds() {
        assert_eq!(parse_odds("2.00").unwrap(), 2.0);
        assert_eq!(parse_odds(" 1,85 ").unwrap(), 1.85);
        assert!(parse_odds("abc").is_err());
        assert!(parse_odds("").is_err());
        assert!(parse_odds("0.9").is_err());
    }

    #[test]
    fn test_validate_learning_rate() {
        assert!(validate_learning_rate(0.05).is_ok());
        assert!(validate_learning_rate(0.0).is_err());
        assert!(validate_learning_rate(1.0).is_err());
        assert!(validate_learning_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_kelly_fraction() {
        assert!(validate_kelly_fraction(1.0).is_ok());
        assert!(validate_kelly_fraction(0.1).is_ok());
        assert!(validate_kelly_fraction(0.0).is_err());
        assert!(validate_kelly_fraction(1.5).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Validation("test error".to_string());
        assert!(err.to_string().contains("Validation error"));

        let err: AppError = LedgerError::NonPositiveAmount(0.0).into();
        assert!(err.to_string().contains("Ledger declined"));
    }
}
