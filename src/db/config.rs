use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "faturas";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: &Path) -> Self {
        ConfigStore {
            path: dir.join(CONFIG_FILE),
        }
    }

    /// `<platform config dir>/faturas`.
    pub fn default_dir() -> AppResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| AppError::Config("no config directory on this platform".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppConfig {
        match self.try_load() {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "failed to read config");
                AppConfig::default()
            }
        }
    }

    pub fn save(&self, config: &AppConfig) -> bool {
        match self.try_save(config) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "failed to write config");
                false
            }
        }
    }

    fn try_load(&self) -> AppResult<AppConfig> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn try_save(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    }
}
