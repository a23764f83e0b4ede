//! Settings file loading

use crate::{models::Settings, Result};
use std::path::PathBuf;

pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load and validate the settings file; a missing or blank file yields defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::warn!(
                "Settings file {} not found, using defaults",
                self.path.display()
            );
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;

        // Handle empty file case
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;

        Ok(())
    }
}
