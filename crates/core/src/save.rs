//! Save-game persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{business::BusinessRecord, ledger::Ledger};

/// File name used when no save path is configured.
pub const DEFAULT_SAVE_FILE: &str = "python_tycoon_save.json";

/// Serialized representation of a save file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Player name chosen on first run.
    pub username: String,
    /// Balance at the time of saving.
    pub balance: f64,
    /// Businesses in ledger order.
    pub businesses: Vec<BusinessRecord>,
}

/// Manager responsible for loading and writing the save file.
#[derive(Debug, Clone)]
pub struct SaveManager {
    path: PathBuf,
}

impl SaveManager {
    /// Create a manager for the save file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default save location, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_SAVE_FILE)
    }

    /// Location of the save file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a save exists yet.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the saved ledger, or `None` on first run.
    pub fn load(&self) -> Result<Option<Ledger>> {
        if !self.exists() {
            return Ok(None);
        }
        let record = self.read_record()?;
        let ledger = Ledger::from_record(record)
            .with_context(|| format!("invalid save file {}", self.path.display()))?;
        info!(
            "loaded save for '{}' from {}",
            ledger.username(),
            self.path.display()
        );
        Ok(Some(ledger))
    }

    /// Overwrite the save file with the given ledger.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        self.persist(&ledger.to_record())
    }

    /// Overwrite the save file with an already-captured record.
    pub fn persist(&self, record: &SaveRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(record)?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        info!("saved game for '{}' to {}", record.username, self.path.display());
        Ok(())
    }

    fn read_record(&self) -> Result<SaveRecord> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(record)
    }
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_run_has_no_save() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path().join("save.json"));
        assert!(!manager.exists());
        assert!(manager.load()?.is_none());
        Ok(())
    }

    #[test]
    fn save_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path().join("nested").join("save.json"));

        let mut ledger = Ledger::new_game("alice");
        ledger.upgrade_business(1)?;
        ledger.credit(12.5);
        manager.save(&ledger)?;
        assert!(manager.exists());

        let loaded = manager.load()?.expect("expected a saved ledger");
        assert_eq!(loaded.username(), "alice");
        assert_eq!(loaded.balance(), ledger.balance());
        assert_eq!(loaded.to_record(), ledger.to_record());
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_state() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path().join("save.json"));

        let mut ledger = Ledger::new_game("alice");
        manager.save(&ledger)?;
        ledger.debit(40.0);
        manager.save(&ledger)?;

        let loaded = manager.load()?.expect("expected a saved ledger");
        assert_eq!(loaded.balance(), 60.0);
        Ok(())
    }

    #[test]
    fn loads_hand_written_save_without_timers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("save.json");
        fs::write(
            &path,
            r#"{"username": "bob", "balance": 250.5, "businesses": [
                {"name": "Lemonade Stand", "base_income": 12.0, "income_interval": 4.5, "level": 2}
            ]}"#,
        )?;

        let ledger = SaveManager::new(&path).load()?.expect("expected a saved ledger");
        assert_eq!(ledger.username(), "bob");
        assert_eq!(ledger.balance(), 250.5);
        assert_eq!(ledger.businesses().len(), 1);
        assert_eq!(ledger.businesses()[0].level(), 2);
        Ok(())
    }

    #[test]
    fn corrupt_save_is_a_contextual_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("save.json");
        fs::write(&path, "{ not json")?;

        let err = SaveManager::new(&path).load().expect_err("corrupt save must fail");
        assert!(err.to_string().contains("failed to parse"));
        Ok(())
    }

    #[test]
    fn save_uses_flat_record_layout() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path().join("save.json"));
        manager.save(&Ledger::new_game("alice"))?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(manager.path())?)?;
        assert_eq!(value["username"], "alice");
        assert_eq!(value["balance"], 100.0);
        assert_eq!(value["businesses"][2]["name"], "Car Wash");
        assert!(value["businesses"][0]["last_collected"].is_number());
        Ok(())
    }
}
