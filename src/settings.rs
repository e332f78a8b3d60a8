//! User settings persisted in `settings.json`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{validate_kelly_fraction, validate_learning_rate, AppError};

pub const DEFAULT_LEARNING_RATE: f64 = 0.05;
pub const DEFAULT_KELLY_FRACTION: f64 = 0.25;

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => f.write_str("dark"),
            Theme::Light => f.write_str("light"),
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(AppError::Validation(format!(
                "Theme must be 'dark' or 'light', got '{}'",
                other
            ))),
        }
    }
}

/// Settings read by staking (Kelly fraction) and learning (learning rate)
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Opaque data-provider key; stored but never displayed
    pub api_key: String,
    pub learning_rate: f64,
    pub kelly_fraction: f64,
    pub notifications: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            learning_rate: DEFAULT_LEARNING_RATE,
            kelly_fraction: DEFAULT_KELLY_FRACTION,
            notifications: true,
            theme: Theme::Dark,
        }
    }
}

// Never print the API key.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field(
                "api_key",
                &if self.api_key.is_empty() { "" } else { "[REDACTED]" },
            )
            .field("learning_rate", &self.learning_rate)
            .field("kelly_fraction", &self.kelly_fraction)
            .field("notifications", &self.notifications)
            .field("theme", &self.theme)
            .finish()
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_learning_rate(self.learning_rate)?;
        validate_kelly_fraction(self.kelly_fraction)?;
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.learning_rate, 0.05);
        assert_eq!(settings.kelly_fraction, 0.25);
        assert!(settings.notifications);
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = Settings {
            api_key: "super-secret".to_string(),
            ..Settings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_validate_bounds() {
        let mut settings = Settings::default();
        settings.learning_rate = 1.0;
        assert!(settings.validate().is_err());

        settings.learning_rate = 0.1;
        settings.kelly_fraction = 1.0;
        assert!(settings.validate().is_ok());

        settings.kelly_fraction = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.learning_rate, DEFAULT_LEARNING_RATE);
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("blue".parse::<Theme>().is_err());
    }
}
