//! Week plan export.
//!
//! A [`PlanSheet`] is the printable content of one week: title, date range,
//! one column per weekday and the allergen/additive legend. Page layout is
//! left to the [`PdfExporter`] implementation supplied by the host.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::error::StoreError;
use crate::services::products::entry_label;
use crate::store::WeekPlanStore;
use crate::types::{Config, MealType, WeekDay, WeekPlan};
use crate::week::{self, CalendarWeek};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No week plan for {0}")]
    PlanNotFound(CalendarWeek),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering failed: {0}")]
    Render(String),
}

/// Renders a sheet to a file, typically a landscape A4 PDF.
pub trait PdfExporter {
    fn export(&self, sheet: &PlanSheet, path: &Path) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub day: WeekDay,
    pub date: NaiveDate,
    /// "Montag, 16.02."
    pub header: String,
    /// Label of a holiday or closing day. Such days have no meal rows.
    pub special: Option<String>,
    pub breakfast: Vec<String>,
    pub snack: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSheet {
    pub title: String,
    pub facility_name: Option<String>,
    pub date_range: String,
    pub days: Vec<DayColumn>,
    pub allergen_legend: Vec<String>,
    pub additive_legend: Vec<String>,
    /// "Erstellt am 17.10.2026"
    pub footer: String,
}

impl PlanSheet {
    pub fn build(plan: &WeekPlan, facility_name: Option<&str>, created_on: NaiveDate) -> Self {
        let days = week::week_days(plan.year, plan.week);
        let first = days[0];
        let last = days[days.len() - 1];

        let columns = WeekDay::ALL
            .iter()
            .zip(days.iter())
            .map(|(&day, &date)| {
                let special = plan.special_day(day).map(|s| s.display_label().to_string());
                let labels = |meal| -> Vec<String> {
                    if special.is_some() {
                        return Vec::new();
                    }
                    plan.entries_for(day, meal)
                        .into_iter()
                        .map(entry_label)
                        .collect()
                };
                DayColumn {
                    day,
                    date,
                    header: format!("{}, {}", day.display_name(), week::format_date_short(date)),
                    breakfast: labels(MealType::Fruehstueck),
                    snack: labels(MealType::Vesper),
                    special,
                }
            })
            .collect();

        let mut allergens = BTreeMap::new();
        let mut additives = BTreeMap::new();
        for product in plan.entries.iter().filter_map(|e| e.product.as_ref()) {
            for a in &product.allergens {
                allergens.insert(a.id.clone(), a.name.clone());
            }
            for a in &product.additives {
                additives.insert(a.id.clone(), a.name.clone());
            }
        }
        let legend = |codes: BTreeMap<String, String>| -> Vec<String> {
            codes
                .into_iter()
                .map(|(id, name)| format!("{} = {}", id, name))
                .collect()
        };

        PlanSheet {
            title: format!("Wochenspeiseplan KW {} / {}", plan.week, plan.year),
            facility_name: facility_name.map(str::to_string),
            date_range: format!(
                "{} – {}",
                first.format("%d.%m.%Y"),
                last.format("%d.%m.%Y")
            ),
            days: columns,
            allergen_legend: legend(allergens),
            additive_legend: legend(additives),
            footer: format!("Erstellt am {}", created_on.format("%d.%m.%Y")),
        }
    }
}

/// File name for an exported week, e.g. `Speiseplan_KW08_2026.pdf`.
pub fn export_file_name(week: CalendarWeek) -> String {
    format!("Speiseplan_KW{:02}_{}.pdf", week.week, week.year)
}

/// Target path inside the configured export directory, or the home
/// directory when none is configured.
pub fn default_export_path(config: &Config, week: CalendarWeek) -> PathBuf {
    let dir = config
        .export_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_default();
    dir.join(export_file_name(week))
}

/// Load the plan for `week` and hand its sheet to `exporter`.
pub fn export_week_plan(
    store: &dyn WeekPlanStore,
    exporter: &dyn PdfExporter,
    config: &Config,
    week: CalendarWeek,
    path: &Path,
) -> Result<PlanSheet, ExportError> {
    let plan = store
        .get_week_plan(week)?
        .ok_or(ExportError::PlanNotFound(week))?;
    let sheet = PlanSheet::build(
        &plan,
        config.facility_name.as_deref(),
        Local::now().date_naive(),
    );
    exporter.export(&sheet, path)?;
    log::info!("Exported {} to {}", week, path.display());
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;
    use crate::store::{MemoryStore, ProductStore};
    use crate::types::{NewPlanEntry, ProductDraft, SpecialDayKind};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingExporter {
        exported: Mutex<Vec<(String, PathBuf)>>,
    }

    impl PdfExporter for RecordingExporter {
        fn export(&self, sheet: &PlanSheet, path: &Path) -> Result<(), ExportError> {
            self.exported
                .lock()
                .push((sheet.title.clone(), path.to_path_buf()));
            Ok(())
        }
    }

    struct FailingExporter;

    impl PdfExporter for FailingExporter {
        fn export(&self, _sheet: &PlanSheet, _path: &Path) -> Result<(), ExportError> {
            Err(ExportError::Render("font missing".to_string()))
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn week(year: i32, week: u32) -> CalendarWeek {
        CalendarWeek { year, week }
    }

    fn store_with_plan() -> MemoryStore {
        let store = MemoryStore::new();
        seed_catalog(&store).unwrap();
        let bread = store
            .create_product(&ProductDraft {
                name: "Vollkornbrot".to_string(),
                multiline: false,
                allergen_ids: vec!["a".to_string()],
                additive_ids: vec![],
            })
            .unwrap();
        let yogurt = store
            .create_product(&ProductDraft {
                name: "Fruchtjoghurt".to_string(),
                multiline: true,
                allergen_ids: vec!["g".to_string()],
                additive_ids: vec!["K".to_string(), "F".to_string()],
            })
            .unwrap();

        let plan = store.create_week_plan(week(2026, 8)).unwrap();
        let entries = [
            NewPlanEntry::product(WeekDay::Monday, MealType::Fruehstueck, bread.id),
            NewPlanEntry::custom(WeekDay::Monday, MealType::Fruehstueck, "Obstteller").with_group("Krippe"),
            NewPlanEntry::product(WeekDay::Monday, MealType::Vesper, yogurt.id),
            NewPlanEntry::product(WeekDay::Friday, MealType::Vesper, yogurt.id),
        ];
        for entry in &entries {
            store.add_plan_entry(plan.id, entry).unwrap();
        }
        store
            .set_special_day(plan.id, WeekDay::Friday, SpecialDayKind::Schliesstag, Some("Teamtag"))
            .unwrap();
        store
    }

    #[test]
    fn test_sheet_header_and_columns() {
        let store = store_with_plan();
        let plan = store.get_week_plan(week(2026, 8)).unwrap().unwrap();
        let sheet = PlanSheet::build(&plan, Some("Kita Sonnenschein"), ymd(2026, 2, 13));

        assert_eq!(sheet.title, "Wochenspeiseplan KW 8 / 2026");
        assert_eq!(sheet.date_range, "16.02.2026 – 20.02.2026");
        assert_eq!(sheet.footer, "Erstellt am 13.02.2026");
        assert_eq!(sheet.facility_name.as_deref(), Some("Kita Sonnenschein"));
        assert_eq!(sheet.days.len(), 5);

        let monday = &sheet.days[0];
        assert_eq!(monday.header, "Montag, 16.02.");
        assert_eq!(monday.breakfast, vec!["Vollkornbrot (a)", "[Krippe] Obstteller"]);
        assert_eq!(monday.snack, vec!["Fruchtjoghurt\n  [g,F,K]"]);
        assert_eq!(sheet.days[2].header, "Mittwoch, 18.02.");
        assert!(sheet.days[2].breakfast.is_empty());
    }

    #[test]
    fn test_special_day_hides_meals() {
        let store = store_with_plan();
        let plan = store.get_week_plan(week(2026, 8)).unwrap().unwrap();
        let sheet = PlanSheet::build(&plan, None, ymd(2026, 2, 13));

        let friday = &sheet.days[4];
        assert_eq!(friday.special.as_deref(), Some("Teamtag"));
        assert!(friday.snack.is_empty());
    }

    #[test]
    fn test_legend_lists_used_codes_only() {
        let store = store_with_plan();
        let plan = store.get_week_plan(week(2026, 8)).unwrap().unwrap();
        let sheet = PlanSheet::build(&plan, None, ymd(2026, 2, 13));

        assert_eq!(sheet.allergen_legend.len(), 2);
        assert!(sheet.allergen_legend[0].starts_with("a = glutenhaltiges Getreide"));
        assert_eq!(sheet.allergen_legend[1], "g = Milch (einschließlich Laktose)");
        assert_eq!(
            sheet.additive_legend,
            vec!["F = Farbstoff", "K = Konservierungsstoff"]
        );
    }

    #[test]
    fn test_export_file_name_and_default_path() {
        assert_eq!(export_file_name(week(2026, 8)), "Speiseplan_KW08_2026.pdf");

        let config = Config {
            export_dir: Some("/tmp/plans".to_string()),
            ..Config::default()
        };
        assert_eq!(
            default_export_path(&config, week(2027, 1)),
            PathBuf::from("/tmp/plans/Speiseplan_KW01_2027.pdf")
        );
    }

    #[test]
    fn test_export_week_plan_delegates() {
        let store = store_with_plan();
        let exporter = RecordingExporter::default();
        let path = PathBuf::from("/tmp/plan.pdf");

        let sheet =
            export_week_plan(&store, &exporter, &Config::default(), week(2026, 8), &path).unwrap();
        assert_eq!(sheet.facility_name, None);
        assert_eq!(
            exporter.exported.lock().clone(),
            vec![("Wochenspeiseplan KW 8 / 2026".to_string(), path)]
        );
    }

    #[test]
    fn test_export_week_plan_errors() {
        let store = store_with_plan();
        let config = Config::default();
        let path = PathBuf::from("/tmp/plan.pdf");

        let missing = export_week_plan(&store, &FailingExporter, &config, week(2026, 9), &path);
        assert!(matches!(missing, Err(ExportError::PlanNotFound(w)) if w == week(2026, 9)));

        let failed = export_week_plan(&store, &FailingExporter, &config, week(2026, 8), &path);
        assert!(matches!(failed, Err(ExportError::Render(_))));
    }
}
