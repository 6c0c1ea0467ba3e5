//! In-process store backing both catalog and week plans.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{ProductStore, StoreResult, WeekPlanStore};
use crate::error::StoreError;
use crate::types::{
    Additive, Allergen, NewPlanEntry, PlanEntry, PlanEntryUpdate, Product, ProductDraft,
    SpecialDay, SpecialDayKind, WeekDay, WeekPlan,
};
use crate::week::CalendarWeek;

#[derive(Debug, Clone)]
struct ProductRow {
    id: i64,
    name: String,
    multiline: bool,
    allergen_ids: Vec<String>,
    additive_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct PlanRow {
    id: i64,
    week: CalendarWeek,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    allergens: BTreeMap<String, Allergen>,
    additives: BTreeMap<String, Additive>,
    products: BTreeMap<i64, ProductRow>,
    plans: BTreeMap<i64, PlanRow>,
    /// Entries are kept without their product; it is resolved on read.
    entries: BTreeMap<i64, PlanEntry>,
    special_days: BTreeMap<i64, SpecialDay>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn resolve_product(&self, row: &ProductRow) -> Product {
        let mut allergens: Vec<Allergen> = row
            .allergen_ids
            .iter()
            .filter_map(|id| self.allergens.get(id).cloned())
            .collect();
        allergens.sort_by(|a, b| a.id.cmp(&b.id));

        let mut additives: Vec<Additive> = row
            .additive_ids
            .iter()
            .filter_map(|id| self.additives.get(id).cloned())
            .collect();
        additives.sort_by(|a, b| a.id.cmp(&b.id));

        Product {
            id: row.id,
            name: row.name.clone(),
            multiline: row.multiline,
            allergens,
            additives,
        }
    }

    fn product(&self, id: i64) -> StoreResult<Product> {
        self.products
            .get(&id)
            .map(|row| self.resolve_product(row))
            .ok_or(StoreError::ProductNotFound(id))
    }

    fn resolve_entry(&self, entry: &PlanEntry) -> PlanEntry {
        let mut entry = entry.clone();
        entry.product = entry.product_id.and_then(|id| self.product(id).ok());
        entry
    }

    fn resolve_plan(&self, row: &PlanRow) -> WeekPlan {
        let mut entries: Vec<PlanEntry> = self
            .entries
            .values()
            .filter(|e| e.week_plan_id == row.id)
            .map(|e| self.resolve_entry(e))
            .collect();
        entries.sort_by_key(|e| (e.day, e.meal, e.slot));

        let mut special_days: Vec<SpecialDay> = self
            .special_days
            .values()
            .filter(|s| s.week_plan_id == row.id)
            .cloned()
            .collect();
        special_days.sort_by_key(|s| s.day);

        WeekPlan {
            id: row.id,
            year: row.week.year,
            week: row.week.week,
            created_at: row.created_at,
            entries,
            special_days,
        }
    }

    fn plan_row(&self, id: i64) -> StoreResult<&PlanRow> {
        self.plans.get(&id).ok_or(StoreError::WeekPlanNotFound(id))
    }

    /// Validates a draft and returns (name, allergen ids, additive ids) cleaned up.
    fn check_draft(&self, draft: &ProductDraft) -> StoreResult<(String, Vec<String>, Vec<String>)> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyProductName);
        }
        let allergen_ids = dedup(&draft.allergen_ids);
        if let Some(unknown) = allergen_ids.iter().find(|id| !self.allergens.contains_key(*id)) {
            return Err(StoreError::UnknownAllergen(unknown.clone()));
        }
        let additive_ids = dedup(&draft.additive_ids);
        if let Some(unknown) = additive_ids.iter().find(|id| !self.additives.contains_key(*id)) {
            return Err(StoreError::UnknownAdditive(unknown.clone()));
        }
        Ok((name.to_string(), allergen_ids, additive_ids))
    }

    fn check_product_ref(&self, product_id: Option<i64>) -> StoreResult<()> {
        match product_id {
            Some(id) if !self.products.contains_key(&id) => Err(StoreError::ProductNotFound(id)),
            _ => Ok(()),
        }
    }

    /// Without an explicit slot the entry goes after the last one of its
    /// day and meal.
    fn insert_entry(
        &mut self,
        week_plan_id: i64,
        entry: &NewPlanEntry,
        slot: Option<u32>,
    ) -> StoreResult<PlanEntry> {
        self.plan_row(week_plan_id)?;
        self.check_product_ref(entry.product_id)?;

        let custom_text = non_blank(entry.custom_text.as_ref());
        if entry.product_id.is_none() && custom_text.is_none() {
            return Err(StoreError::EmptyEntry(entry.day));
        }

        let slot = slot.unwrap_or_else(|| {
            self.entries
                .values()
                .filter(|e| {
                    e.week_plan_id == week_plan_id && e.day == entry.day && e.meal == entry.meal
                })
                .map(|e| e.slot + 1)
                .max()
                .unwrap_or(0)
        });

        let id = self.next_id();
        let row = PlanEntry {
            id,
            week_plan_id,
            day: entry.day,
            meal: entry.meal,
            slot,
            product_id: entry.product_id,
            product: None,
            custom_text,
            group_label: non_blank(entry.group_label.as_ref()),
        };
        log::debug!(
            "Added entry {} to plan {} ({:?} {:?} slot {})",
            id,
            week_plan_id,
            entry.day,
            entry.meal,
            slot
        );
        let resolved = self.resolve_entry(&row);
        self.entries.insert(id, row);
        Ok(resolved)
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

/// Blank strings are stored as absent.
fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Catalog and week plans held in memory behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for MemoryStore {
    fn list_products(&self) -> StoreResult<Vec<Product>> {
        let tables = self.tables.lock();
        let mut products: Vec<Product> = tables
            .products
            .values()
            .map(|row| tables.resolve_product(row))
            .collect();
        products.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(products)
    }

    fn get_product(&self, id: i64) -> StoreResult<Product> {
        self.tables.lock().product(id)
    }

    fn find_product_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        let tables = self.tables.lock();
        let name = name.trim();
        Ok(tables
            .products
            .values()
            .find(|row| row.name == name)
            .map(|row| tables.resolve_product(row)))
    }

    fn create_product(&self, draft: &ProductDraft) -> StoreResult<Product> {
        let mut tables = self.tables.lock();
        let (name, allergen_ids, additive_ids) = tables.check_draft(draft)?;
        if tables.products.values().any(|row| row.name == name) {
            return Err(StoreError::DuplicateProduct(name));
        }

        let id = tables.next_id();
        let row = ProductRow {
            id,
            name,
            multiline: draft.multiline,
            allergen_ids,
            additive_ids,
        };
        log::info!("Created product {} '{}'", id, row.name);
        tables.products.insert(id, row);
        tables.product(id)
    }

    fn update_product(&self, id: i64, draft: &ProductDraft) -> StoreResult<Product> {
        let mut tables = self.tables.lock();
        if !tables.products.contains_key(&id) {
            return Err(StoreError::ProductNotFound(id));
        }
        let (name, allergen_ids, additive_ids) = tables.check_draft(draft)?;
        if tables
            .products
            .values()
            .any(|row| row.id != id && row.name == name)
        {
            return Err(StoreError::DuplicateProduct(name));
        }

        if let Some(row) = tables.products.get_mut(&id) {
            row.name = name;
            row.multiline = draft.multiline;
            row.allergen_ids = allergen_ids;
            row.additive_ids = additive_ids;
        }
        log::info!("Updated product {}", id);
        tables.product(id)
    }

    fn delete_product(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if !tables.products.contains_key(&id) {
            return Err(StoreError::ProductNotFound(id));
        }
        if tables.entries.values().any(|e| e.product_id == Some(id)) {
            return Err(StoreError::ProductInUse(id));
        }
        tables.products.remove(&id);
        log::info!("Deleted product {}", id);
        Ok(())
    }

    fn list_allergens(&self) -> StoreResult<Vec<Allergen>> {
        Ok(self.tables.lock().allergens.values().cloned().collect())
    }

    fn list_additives(&self) -> StoreResult<Vec<Additive>> {
        Ok(self.tables.lock().additives.values().cloned().collect())
    }

    fn insert_allergen(&self, allergen: Allergen) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        if tables.allergens.contains_key(&allergen.id) {
            return Ok(false);
        }
        tables.allergens.insert(allergen.id.clone(), allergen);
        Ok(true)
    }

    fn insert_additive(&self, additive: Additive) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        if tables.additives.contains_key(&additive.id) {
            return Ok(false);
        }
        tables.additives.insert(additive.id.clone(), additive);
        Ok(true)
    }
}

impl WeekPlanStore for MemoryStore {
    fn get_week_plan(&self, week: CalendarWeek) -> StoreResult<Option<WeekPlan>> {
        let tables = self.tables.lock();
        Ok(tables
            .plans
            .values()
            .find(|row| row.week == week)
            .map(|row| tables.resolve_plan(row)))
    }

    fn get_week_plan_by_id(&self, id: i64) -> StoreResult<WeekPlan> {
        let tables = self.tables.lock();
        let row = tables.plan_row(id)?;
        Ok(tables.resolve_plan(row))
    }

    fn create_week_plan(&self, week: CalendarWeek) -> StoreResult<WeekPlan> {
        if !week.is_valid() {
            return Err(StoreError::InvalidWeek(week));
        }
        let mut tables = self.tables.lock();
        if tables.plans.values().any(|row| row.week == week) {
            return Err(StoreError::DuplicateWeekPlan(week));
        }

        let id = tables.next_id();
        let row = PlanRow {
            id,
            week,
            created_at: Utc::now(),
        };
        let plan = tables.resolve_plan(&row);
        tables.plans.insert(id, row);
        log::info!("Created week plan {} for {}", id, week);
        Ok(plan)
    }

    fn add_plan_entry(&self, week_plan_id: i64, entry: &NewPlanEntry) -> StoreResult<PlanEntry> {
        self.tables.lock().insert_entry(week_plan_id, entry, None)
    }

    fn insert_plan_entry_at(
        &self,
        week_plan_id: i64,
        entry: &NewPlanEntry,
        slot: u32,
    ) -> StoreResult<PlanEntry> {
        self.tables.lock().insert_entry(week_plan_id, entry, Some(slot))
    }

    fn update_plan_entry(&self, id: i64, update: &PlanEntryUpdate) -> StoreResult<PlanEntry> {
        let mut tables = self.tables.lock();
        tables.check_product_ref(update.product_id)?;

        let custom_text = non_blank(update.custom_text.as_ref());
        let row = tables
            .entries
            .get_mut(&id)
            .ok_or(StoreError::EntryNotFound(id))?;
        if update.product_id.is_none() && custom_text.is_none() {
            return Err(StoreError::EmptyEntry(row.day));
        }
        row.product_id = update.product_id;
        row.custom_text = custom_text;
        row.group_label = non_blank(update.group_label.as_ref());

        let row = row.clone();
        Ok(tables.resolve_entry(&row))
    }

    fn remove_plan_entry(&self, id: i64) -> StoreResult<()> {
        self.tables
            .lock()
            .entries
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::EntryNotFound(id))
    }

    fn set_special_day(
        &self,
        week_plan_id: i64,
        day: WeekDay,
        kind: SpecialDayKind,
        label: Option<&str>,
    ) -> StoreResult<SpecialDay> {
        let mut tables = self.tables.lock();
        tables.plan_row(week_plan_id)?;

        tables
            .special_days
            .retain(|_, s| !(s.week_plan_id == week_plan_id && s.day == day));

        let id = tables.next_id();
        let special = SpecialDay {
            id,
            week_plan_id,
            day,
            kind,
            label: label
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };
        tables.special_days.insert(id, special.clone());
        Ok(special)
    }

    fn remove_special_day(&self, week_plan_id: i64, day: WeekDay) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.plan_row(week_plan_id)?;
        tables
            .special_days
            .retain(|_, s| !(s.week_plan_id == week_plan_id && s.day == day));
        Ok(())
    }
}
