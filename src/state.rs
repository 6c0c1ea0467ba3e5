use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;

use crate::catalog::seed_catalog;
use crate::export::{self, ExportError, PdfExporter, PlanSheet};
use crate::planner::WeekPlanner;
use crate::store::MemoryStore;
use crate::types::Config;

/// Application state shared by the host
pub struct AppState {
    pub config: Mutex<Config>,
    pub store: Arc<MemoryStore>,
    pub planner: Mutex<WeekPlanner>,
}

impl AppState {
    /// Load config from disk (defaults when absent) and open on today's week.
    pub fn new() -> Self {
        let config = load_config().unwrap_or_else(|e| {
            log::warn!("{}. Using default config.", e);
            Config::default()
        });
        Self::with_config(config, Local::now().date_naive())
    }

    pub fn with_config(config: Config, today: NaiveDate) -> Self {
        let store = Arc::new(MemoryStore::new());
        if config.seed_catalog {
            if let Err(e) = seed_catalog(&*store) {
                log::warn!("Failed to seed catalog: {e}");
            }
        }

        Self {
            config: Mutex::new(config),
            store,
            planner: Mutex::new(WeekPlanner::new(today)),
        }
    }

    /// Snapshot of the current config
    pub fn config(&self) -> Config {
        self.config.lock().clone()
    }

    /// Export the planner's selected week to `path`, or to the default
    /// export location when no path is given.
    pub fn export_selected_week(
        &self,
        exporter: &dyn PdfExporter,
        path: Option<&Path>,
    ) -> Result<(PlanSheet, PathBuf), ExportError> {
        let config = self.config();
        let week = self.planner.lock().selected();
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => export::default_export_path(&config, week),
        };
        let sheet = export::export_week_plan(&*self.store, exporter, &config, week, &target)?;
        Ok((sheet, target))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the canonical config file path (~/.speiseplan/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".speiseplan").join("config.json"))
}

/// Load configuration from ~/.speiseplan/config.json
pub fn load_config() -> Result<Config, String> {
    load_config_from(&config_path()?)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Write `config` to `path`, creating the parent directory if needed.
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}

/// Apply `mutator` to the in-memory config and persist it to
/// ~/.speiseplan/config.json.
pub fn create_or_update_config(
    state: &AppState,
    mutator: impl FnOnce(&mut Config),
) -> Result<Config, String> {
    update_config_at(state, &config_path()?, mutator)
}

/// Same as [`create_or_update_config`] with an explicit file location.
///
/// The in-memory config only changes once the write succeeded.
pub fn update_config_at(
    state: &AppState,
    path: &Path,
    mutator: impl FnOnce(&mut Config),
) -> Result<Config, String> {
    let mut guard = state.config.lock();

    let mut config = guard.clone();
    mutator(&mut config);
    save_config_to(path, &config)?;

    *guard = config.clone();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ProductStore, WeekPlanStore};
    use crate::week::CalendarWeek;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 18).expect("valid test date")
    }

    struct NullExporter;

    impl PdfExporter for NullExporter {
        fn export(&self, _sheet: &PlanSheet, _path: &Path) -> Result<(), ExportError> {
            Ok(())
        }
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.group_labels, vec!["Krippe", "Kita", "Hort"]);
        assert!(config.seed_catalog);
    }

    #[test]
    fn test_load_config_partial_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"facilityName": "Kita Regenbogen"}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.facility_name.as_deref(), Some("Kita Regenbogen"));
        assert_eq!(config.group_labels.len(), 3);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[test]
    fn test_update_config_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");
        let state = AppState::with_config(Config::default(), today());

        let updated = update_config_at(&state, &path, |c| {
            c.export_dir = Some("/srv/plans".to_string());
        })
        .unwrap();

        assert_eq!(state.config().export_dir.as_deref(), Some("/srv/plans"));
        assert_eq!(load_config_from(&path).unwrap(), updated);
    }

    #[test]
    fn test_with_config_seeding() {
        let seeded = AppState::with_config(Config::default(), today());
        assert_eq!(seeded.store.list_allergens().unwrap().len(), 14);

        let bare = AppState::with_config(
            Config {
                seed_catalog: false,
                ..Config::default()
            },
            today(),
        );
        assert!(bare.store.list_allergens().unwrap().is_empty());
    }

    #[test]
    fn test_export_selected_week_default_path() {
        let state = AppState::with_config(
            Config {
                export_dir: Some("/tmp/speiseplan".to_string()),
                ..Config::default()
            },
            today(),
        );
        let week = CalendarWeek { year: 2026, week: 8 };
        assert_eq!(state.planner.lock().selected(), week);

        assert!(matches!(
            state.export_selected_week(&NullExporter, None),
            Err(ExportError::PlanNotFound(w)) if w == week
        ));

        state.store.create_week_plan(week).unwrap();
        let (sheet, path) = state.export_selected_week(&NullExporter, None).unwrap();
        assert_eq!(sheet.title, "Wochenspeiseplan KW 8 / 2026");
        assert_eq!(path, PathBuf::from("/tmp/speiseplan/Speiseplan_KW08_2026.pdf"));
    }
}
