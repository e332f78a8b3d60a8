//! JSON persistence for the model, bankroll and settings records
//!
//! One pretty-printed JSON object per file under the data directory:
//! - `model.json` - learned weights, velocity, outcome history
//! - `bankroll.json` - balance, totals and transaction log
//! - `settings.json` - user settings
//!
//! Loads and saves report failures as [`StoreError`]; falling back to
//! defaults is the caller's decision.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::{BankrollState, ModelState};
use crate::settings::Settings;

/// Sub-directory name under the platform data dir or the home dir
pub const APP_DIR_NAME: &str = "matchedge";
pub const MODEL_FILE: &str = "model.json";
pub const BANKROLL_FILE: &str = "bankroll.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No data directory could be resolved")]
    NoDataDir,

    #[error("Record not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed record {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Platform data directory if available, else the home directory, joined
/// with [`APP_DIR_NAME`]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(APP_DIR_NAME))
}

/// File-backed record store rooted at one directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at [`default_data_dir`]
    pub fn open_default() -> Result<Self, StoreError> {
        default_data_dir().map(Self::new).ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn load_model(&self) -> Result<ModelState, StoreError> {
        self.load(MODEL_FILE)
    }

    pub fn save_model(&self, model: &ModelState) -> Result<(), StoreError> {
        self.save(MODEL_FILE, model)
    }

    pub fn load_bankroll(&self) -> Result<BankrollState, StoreError> {
        self.load(BANKROLL_FILE)
    }

    pub fn save_bankroll(&self, bankroll: &BankrollState) -> Result<(), StoreError> {
        self.save(BANKROLL_FILE, bankroll)
    }

    pub fn load_settings(&self) -> Result<Settings, StoreError> {
        self.load(SETTINGS_FILE)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.save(SETTINGS_FILE, settings)
    }

    /// Read and parse one record
    pub fn load<T: DeserializeOwned>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.path_of(file);

        let content = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(path.clone())
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Overwrite one record, creating the directory if needed
    pub fn save<T: Serialize>(&self, file: &str, record: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_of(file);
        let content = serde_json::to_string_pretty(record).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;

        // Write a sibling temp file, then rename over the record
        let temp_path = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: temp_path.clone(),
            source,
        };
        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(content.as_bytes())
            .map_err(io_err)
            .map_err(cleanup_and_err)?;
        file.sync_all().map_err(io_err).map_err(cleanup_and_err)?;
        drop(file);

        fs::rename(&temp_path, &path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })
            .map_err(cleanup_and_err)?;

        debug!("Saved {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WeightAdapter;
    use crate::models::Factor;
    use crate::settings::Theme;
    use chrono::Utc;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let err = store.load_model().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(store.path_of(BANKROLL_FILE), "{ not json").unwrap();

        assert!(matches!(
            store.load_bankroll(),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[test]
    fn test_model_with_bad_weights_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(
            store.path_of(MODEL_FILE),
            r#"{"weights":{"Forme":1.0},"velocity":{},"history":[],"total_cycles":0,"accuracy":0.0}"#,
        )
        .unwrap();

        assert!(matches!(store.load_model(), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_model_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested"));

        let mut model = ModelState::default();
        let adapter = WeightAdapter::new(0.05);
        model.record_outcome(&adapter, "Marseille vs Lyon", true, &Factor::ALL, Utc::now());
        model.record_outcome(&adapter, "Lens vs Nice", false, &[Factor::Form], Utc::now());

        store.save_model(&model).unwrap();
        assert_eq!(store.load_model().unwrap(), model);
    }

    #[test]
    fn test_bankroll_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut bankroll = BankrollState::default();
        bankroll.deposit(100.0).unwrap();
        bankroll.settle_bet(7.3, 2.15, true).unwrap();
        bankroll.withdraw(12.0).unwrap();

        store.save_bankroll(&bankroll).unwrap();
        assert_eq!(store.load_bankroll().unwrap(), bankroll);
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let settings = Settings {
            api_key: "secret".to_string(),
            learning_rate: 0.12,
            kelly_fraction: 0.5,
            notifications: false,
            theme: Theme::Light,
        };

        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings().unwrap(), settings);
    }

    #[test]
    fn test_records_are_independent_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_settings(&Settings::default()).unwrap();

        assert!(store.path_of(SETTINGS_FILE).exists());
        assert!(!store.path_of(MODEL_FILE).exists());
        assert!(store.load_bankroll().unwrap_err().is_not_found());
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let store = Store::new(&blocker);
        assert!(matches!(
            store.save_model(&ModelState::default()),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn test_save_replaces_record_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut bankroll = BankrollState::default();
        bankroll.deposit(100.0).unwrap();
        store.save_bankroll(&bankroll).unwrap();

        bankroll.withdraw(40.0).unwrap();
        store.save_bankroll(&bankroll).unwrap();

        assert_eq!(store.load_bankroll().unwrap(), bankroll);
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![BANKROLL_FILE.to_string()]);
    }

    #[test]
    fn test_stale_temp_file_does_not_affect_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let model = ModelState::default();
        store.save_model(&model).unwrap();

        // Leftover of an interrupted save
        fs::write(store.path_of("model.json.tmp"), "{ trunc").unwrap();
        assert_eq!(store.load_model().unwrap(), model);

        store.save_model(&model).unwrap();
        assert!(!store.path_of("model.json.tmp").exists());
        assert_eq!(store.load_model().unwrap(), model);
    }

    #[test]
    fn test_default_data_dir_uses_app_name() {
        if let Some(dir) = default_data_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }
}
