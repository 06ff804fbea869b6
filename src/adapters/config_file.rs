//! JSON configuration file adapter.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

/// [`ConfigPort`] over a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", self.path.display())))?;
        let config = SystemConfig::from_json(&text)?;
        info!(
            "Loaded config {} ({} pairs, product {})",
            self.path.display(),
            config.harness.len(),
            config.harness.product_no()
        );
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = config.to_json_pretty()?;
        fs::write(&self.path, text)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", self.path.display())))?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}
