use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;
use crate::models::{Invoice, Period};

pub mod config;

/// Invoice files under a workspace folder, one pretty-printed JSON array per month.
#[derive(Debug, Clone)]
pub struct Database {
    workspace: PathBuf,
}

impl Database {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Database {
            workspace: workspace.into(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn period_path(&self, period: Period) -> PathBuf {
        self.workspace
            .join(period.year.to_string())
            .join(format!("{}.json", period.month))
    }

    /// Missing or malformed files read as an empty list.
    pub fn read_invoices(&self, period: Period) -> Vec<Invoice> {
        match self.try_read_invoices(period) {
            Ok(invoices) => invoices,
            Err(err) => {
                tracing::error!(%period, error = %err, "failed to read invoices");
                Vec::new()
            }
        }
    }

    pub fn write_invoices(&self, period: Period, invoices: &[Invoice]) -> bool {
        match self.try_write_invoices(period, invoices) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%period, error = %err, "failed to write invoices");
                false
            }
        }
    }

    fn try_read_invoices(&self, period: Period) -> AppResult<Vec<Invoice>> {
        let path = self.period_path(period);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn try_write_invoices(&self, period: Period, invoices: &[Invoice]) -> AppResult<()> {
        let path = self.period_path(period);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(invoices)?;
        fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), count = invoices.len(), "invoices written");
        Ok(())
    }

    /// Every `<year>/<month>.json` present in the workspace, oldest first.
    pub fn list_periods(&self) -> Vec<Period> {
        let mut periods = walkdir::WalkDir::new(&self.workspace)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| period_from_path(e.path()))
            .collect::<Vec<_>>();
        periods.sort();
        periods
    }
}

fn period_from_path(path: &Path) -> Option<Period> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return None;
    }
    let month = path.file_stem()?.to_str()?.parse::<u32>().ok()?;
    let year = path.parent()?.file_name()?.to_str()?.parse::<i32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(Period::new(year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(id: &str, number: &str, amount: f64) -> Invoice {
        Invoice {
            id: id.to_string(),
            number: number.to_string(),
            atcud: format!("A/{}", id),
            nif: "123456789".to_string(),
            date: "2025-03-14".to_string(),
            amount,
        }
    }

    #[test]
    fn round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path());
        let period = Period::new(2025, 3);
        let invoices = vec![invoice("2", "F2", 12.5), invoice("1", "F1", 3.0)];

        assert!(db.write_invoices(period, &invoices));
        assert_eq!(db.read_invoices(period), invoices);
        assert!(dir.path().join("2025").join("3.json").is_file());
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path());
        assert!(db.read_invoices(Period::new(2024, 1)).is_empty());
    }

    #[test]
    fn malformed_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path());
        let period = Period::new(2025, 7);
        let path = db.period_path(period);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(db.read_invoices(period).is_empty());
    }

    #[test]
    fn write_fails_when_workspace_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let db = Database::new(&blocker);
        assert!(!db.write_invoices(Period::new(2025, 1), &[]));
    }

    #[test]
    fn lists_periods_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path());
        db.write_invoices(Period::new(2025, 11), &[]);
        db.write_invoices(Period::new(2024, 2), &[]);
        db.write_invoices(Period::new(2025, 1), &[]);
        fs::write(dir.path().join("2025").join("notes.txt"), "x").unwrap();

        assert_eq!(
            db.list_periods(),
            vec![Period::new(2024, 2), Period::new(2025, 1), Period::new(2025, 11)]
        );
    }
}
