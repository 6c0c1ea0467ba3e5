use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::week::CalendarWeek;

/// Configuration stored in ~/.speiseplan/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Printed under the plan title when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_name: Option<String>,
    /// Group labels offered for plan entries (Krippe, Kita, Hort by default).
    #[serde(default = "default_group_labels")]
    pub group_labels: Vec<String>,
    /// Target directory for exported plans. Falls back to the home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// Seed the EU allergen and additive tables into an empty catalog.
    #[serde(default = "default_true")]
    pub seed_catalog: bool,
}

fn default_group_labels() -> Vec<String> {
    ["Krippe", "Kita", "Hort"].iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facility_name: None,
            group_labels: default_group_labels(),
            export_dir: None,
            seed_catalog: true,
        }
    }
}

/// One of the 14 EU allergens (ids `a`..`n`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergen {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// German food additive label (ids like `A`, `FM`, `SÜ`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additive {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Print allergen/additive codes on their own line.
    pub multiline: bool,
    #[serde(default)]
    pub allergens: Vec<Allergen>,
    #[serde(default)]
    pub additives: Vec<Additive>,
}

impl Product {
    pub fn has_allergens(&self) -> bool {
        !self.allergens.is_empty()
    }

    pub fn has_additives(&self) -> bool {
        !self.additives.is_empty()
    }

    /// Allergen ids followed by additive ids, in catalog order.
    pub fn codes(&self) -> Vec<&str> {
        self.allergens
            .iter()
            .map(|a| a.id.as_str())
            .chain(self.additives.iter().map(|a| a.id.as_str()))
            .collect()
    }
}

/// Input for creating or updating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub allergen_ids: Vec<String>,
    #[serde(default)]
    pub additive_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Fruehstueck,
    Vesper,
}

impl MealType {
    pub const ALL: [MealType; 2] = [MealType::Fruehstueck, MealType::Vesper];

    pub fn display_name(self) -> &'static str {
        match self {
            MealType::Fruehstueck => "Frühstück",
            MealType::Vesper => "Vesper",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialDayKind {
    Feiertag,
    Schliesstag,
}

impl SpecialDayKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SpecialDayKind::Feiertag => "Feiertag",
            SpecialDayKind::Schliesstag => "Schließtag",
        }
    }
}

/// A planning day, Monday (1) through Friday (5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WeekDay {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
}

impl WeekDay {
    pub const ALL: [WeekDay; 5] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Zero-based offset from Monday.
    pub fn offset(self) -> usize {
        self as usize - 1
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WeekDay::Monday => "Montag",
            WeekDay::Tuesday => "Dienstag",
            WeekDay::Wednesday => "Mittwoch",
            WeekDay::Thursday => "Donnerstag",
            WeekDay::Friday => "Freitag",
        }
    }
}

impl From<WeekDay> for u8 {
    fn from(day: WeekDay) -> Self {
        day.number()
    }
}

impl TryFrom<u8> for WeekDay {
    type Error = InvalidWeekDay;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WeekDay::Monday),
            2 => Ok(WeekDay::Tuesday),
            3 => Ok(WeekDay::Wednesday),
            4 => Ok(WeekDay::Thursday),
            5 => Ok(WeekDay::Friday),
            other => Err(InvalidWeekDay(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWeekDay(pub u8);

impl fmt::Display for InvalidWeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} is not a planning day (1-5)", self.0)
    }
}

impl std::error::Error for InvalidWeekDay {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: i64,
    pub week_plan_id: i64,
    pub day: WeekDay,
    pub meal: MealType,
    /// Order within the day's meal, starting at 0.
    pub slot: u32,
    pub product_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub custom_text: Option<String>,
    pub group_label: Option<String>,
}

/// Input for [`crate::store::WeekPlanStore::add_plan_entry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlanEntry {
    pub day: WeekDay,
    pub meal: MealType,
    pub product_id: Option<i64>,
    pub custom_text: Option<String>,
    pub group_label: Option<String>,
}

impl NewPlanEntry {
    pub fn product(day: WeekDay, meal: MealType, product_id: i64) -> Self {
        Self {
            day,
            meal,
            product_id: Some(product_id),
            custom_text: None,
            group_label: None,
        }
    }

    pub fn custom(day: WeekDay, meal: MealType, text: impl Into<String>) -> Self {
        Self {
            day,
            meal,
            product_id: None,
            custom_text: Some(text.into()),
            group_label: None,
        }
    }

    pub fn with_group(mut self, label: impl Into<String>) -> Self {
        self.group_label = Some(label.into());
        self
    }
}

/// Replacement content for an existing entry. Day, meal and slot stay put.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntryUpdate {
    pub product_id: Option<i64>,
    pub custom_text: Option<String>,
    pub group_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    pub id: i64,
    pub week_plan_id: i64,
    pub day: WeekDay,
    #[serde(rename = "type")]
    pub kind: SpecialDayKind,
    pub label: Option<String>,
}

impl SpecialDay {
    /// The custom label when present, otherwise the kind's name.
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.kind.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub id: i64,
    pub year: i32,
    pub week: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
    #[serde(default)]
    pub special_days: Vec<SpecialDay>,
}

impl WeekPlan {
    pub fn calendar_week(&self) -> CalendarWeek {
        CalendarWeek {
            year: self.year,
            week: self.week,
        }
    }

    /// Entries of one day's meal, ordered by slot.
    pub fn entries_for(&self, day: WeekDay, meal: MealType) -> Vec<&PlanEntry> {
        let mut entries: Vec<&PlanEntry> = self
            .entries
            .iter()
            .filter(|e| e.day == day && e.meal == meal)
            .collect();
        entries.sort_by_key(|e| e.slot);
        entries
    }

    pub fn special_day(&self, day: WeekDay) -> Option<&SpecialDay> {
        self.special_days.iter().find(|s| s.day == day)
    }

    pub fn is_day_special(&self, day: WeekDay) -> bool {
        self.special_day(day).is_some()
    }

    pub fn meal_count(&self, meal: MealType) -> usize {
        self.entries.iter().filter(|e| e.meal == meal).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, day: WeekDay, meal: MealType, slot: u32) -> PlanEntry {
        PlanEntry {
            id,
            week_plan_id: 1,
            day,
            meal,
            slot,
            product_id: None,
            product: None,
            custom_text: Some(format!("entry {id}")),
            group_label: None,
        }
    }

    fn sample_plan() -> WeekPlan {
        WeekPlan {
            id: 1,
            year: 2026,
            week: 8,
            created_at: Utc::now(),
            entries: vec![
                entry(1, WeekDay::Monday, MealType::Fruehstueck, 1),
                entry(2, WeekDay::Monday, MealType::Fruehstueck, 0),
                entry(3, WeekDay::Monday, MealType::Vesper, 0),
                entry(4, WeekDay::Tuesday, MealType::Fruehstueck, 0),
            ],
            special_days: vec![SpecialDay {
                id: 1,
                week_plan_id: 1,
                day: WeekDay::Friday,
                kind: SpecialDayKind::Schliesstag,
                label: None,
            }],
        }
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.group_labels, vec!["Krippe", "Kita", "Hort"]);
        assert!(config.seed_catalog);
    }

    #[test]
    fn test_config_camel_case_fields() {
        let config: Config =
            serde_json::from_str(r#"{"facilityName":"Kita Sonnenschein","seedCatalog":false}"#)
                .unwrap();
        assert_eq!(config.facility_name.as_deref(), Some("Kita Sonnenschein"));
        assert!(!config.seed_catalog);
    }

    #[test]
    fn test_week_day_serializes_as_number() {
        assert_eq!(serde_json::to_string(&WeekDay::Wednesday).unwrap(), "3");
        let day: WeekDay = serde_json::from_str("5").unwrap();
        assert_eq!(day, WeekDay::Friday);
        assert!(serde_json::from_str::<WeekDay>("0").is_err());
        assert!(serde_json::from_str::<WeekDay>("6").is_err());
    }

    #[test]
    fn test_week_day_offsets() {
        assert_eq!(WeekDay::Monday.offset(), 0);
        assert_eq!(WeekDay::Friday.offset(), 4);
        assert_eq!(WeekDay::try_from(9), Err(InvalidWeekDay(9)));
    }

    #[test]
    fn test_meal_and_special_day_wire_names() {
        assert_eq!(serde_json::to_string(&MealType::Fruehstueck).unwrap(), "\"fruehstueck\"");
        assert_eq!(serde_json::to_string(&SpecialDayKind::Schliesstag).unwrap(), "\"schliesstag\"");
        assert_eq!(MealType::Vesper.display_name(), "Vesper");
        assert_eq!(SpecialDayKind::Schliesstag.display_name(), "Schließtag");
    }

    #[test]
    fn test_special_day_serializes_kind_as_type() {
        let plan = sample_plan();
        let json = serde_json::to_value(&plan.special_days[0]).unwrap();
        assert_eq!(json["type"], "schliesstag");
        assert_eq!(json["day"], 5);
    }

    #[test]
    fn test_special_day_display_label() {
        let mut special = sample_plan().special_days.remove(0);
        assert_eq!(special.display_label(), "Schließtag");
        special.label = Some("Teamtag".to_string());
        assert_eq!(special.display_label(), "Teamtag");
        special.label = Some("  ".to_string());
        assert_eq!(special.display_label(), "Schließtag");
    }

    #[test]
    fn test_entries_for_sorted_by_slot() {
        let plan = sample_plan();
        let ids: Vec<i64> = plan
            .entries_for(WeekDay::Monday, MealType::Fruehstueck)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(plan.entries_for(WeekDay::Thursday, MealType::Vesper).is_empty());
    }

    #[test]
    fn test_plan_helpers() {
        let plan = sample_plan();
        assert!(plan.is_day_special(WeekDay::Friday));
        assert!(!plan.is_day_special(WeekDay::Monday));
        assert_eq!(plan.meal_count(MealType::Fruehstueck), 3);
        assert_eq!(plan.meal_count(MealType::Vesper), 1);
        assert_eq!(plan.calendar_week(), CalendarWeek { year: 2026, week: 8 });
    }

    #[test]
    fn test_product_codes_order() {
        let product = Product {
            id: 1,
            name: "Vollkornbrot".to_string(),
            multiline: false,
            allergens: vec![Allergen {
                id: "a".to_string(),
                name: "Gluten".to_string(),
                category: "allergen".to_string(),
            }],
            additives: vec![Additive {
                id: "K".to_string(),
                name: "Konservierungsstoff".to_string(),
            }],
        };
        assert_eq!(product.codes(), vec!["a", "K"]);
        assert!(product.has_allergens());
        assert!(product.has_additives());
    }
}
