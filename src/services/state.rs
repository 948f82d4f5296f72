use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::db::config::ConfigStore;
use crate::db::Database;
use crate::models::{AppConfig, Invoice, Language, Period, SystemTheme, Theme};
use crate::services::strings::Strings;

/// Everything the front-end may ask of the host. Failures come back as `None`, `false` or a default,
/// never as an error.
pub trait HostApi {
    fn get_theme(&self) -> Theme;
    fn set_theme(&self, theme: Theme) -> bool;
    fn get_system_theme(&self) -> SystemTheme;
    fn get_folder(&self) -> Option<PathBuf>;
    fn set_folder(&self, folder: &Path) -> bool;
    fn pick_folder(&self) -> Option<PathBuf>;
    fn read(&self, period: Period) -> Vec<Invoice>;
    fn write(&self, period: Period, invoices: &[Invoice]) -> bool;
    fn get_language(&self) -> Language;
    fn set_language(&self, language: Language) -> bool;
    fn get_strings(&self) -> Strings;
}

pub struct AppState {
    store: ConfigStore,
    config: Mutex<AppConfig>,
}

impl AppState {
    pub fn new(store: ConfigStore) -> Self {
        let config = store.load();
        AppState {
            store,
            config: Mutex::new(config),
        }
    }

    pub fn config(&self) -> AppConfig {
        match self.config.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `change` and persist; the in-memory copy is only replaced when the write succeeds.
    fn update_config(&self, change: impl FnOnce(&mut AppConfig)) -> bool {
        let mut guard = match self.config.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!("config lock poisoned");
                return false;
            }
        };
        let mut next = guard.clone();
        change(&mut next);
        if !self.store.save(&next) {
            return false;
        }
        *guard = next;
        true
    }

    pub fn database(&self) -> Option<Database> {
        self.get_folder().map(Database::new)
    }
}

impl HostApi for AppState {
    fn get_theme(&self) -> Theme {
        self.config().theme
    }

    fn set_theme(&self, theme: Theme) -> bool {
        self.update_config(|config| config.theme = theme)
    }

    fn get_system_theme(&self) -> SystemTheme {
        match dark_light::detect() {
            dark_light::Mode::Dark => SystemTheme::Dark,
            _ => SystemTheme::Light,
        }
    }

    fn get_folder(&self) -> Option<PathBuf> {
        self.config()
            .workspace_folder
            .filter(|folder| !folder.trim().is_empty())
            .map(PathBuf::from)
    }

    fn set_folder(&self, folder: &Path) -> bool {
        if !folder.is_dir() {
            tracing::warn!(folder = %folder.display(), "workspace folder does not exist");
            return false;
        }
        let value = folder.to_string_lossy().to_string();
        self.update_config(|config| config.workspace_folder = Some(value))
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        let picked = rfd::FileDialog::new().pick_folder()?;
        if !self.set_folder(&picked) {
            return None;
        }
        Some(picked)
    }

    fn read(&self, period: Period) -> Vec<Invoice> {
        match self.database() {
            Some(db) => db.read_invoices(period),
            None => {
                tracing::warn!(%period, "read without a workspace folder");
                Vec::new()
            }
        }
    }

    fn write(&self, period: Period, invoices: &[Invoice]) -> bool {
        match self.database() {
            Some(db) => db.write_invoices(period, invoices),
            None => {
                tracing::warn!(%period, "write without a workspace folder");
                false
            }
        }
    }

    fn get_language(&self) -> Language {
        self.config().language
    }

    fn set_language(&self, language: Language) -> bool {
        self.update_config(|config| config.language = language)
    }

    fn get_strings(&self) -> Strings {
        Strings::load(self.get_language())
    }
}
