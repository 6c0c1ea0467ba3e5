// Week plans service
// Plan lookup and copying across weeks, built only on WeekPlanStore.

use crate::error::StoreError;
use crate::store::{StoreResult, WeekPlanStore};
use crate::types::{NewPlanEntry, WeekPlan};
use crate::week::CalendarWeek;

/// Load the plan for `week`, creating an empty one if none exists.
pub fn load_or_create(store: &dyn WeekPlanStore, week: CalendarWeek) -> StoreResult<WeekPlan> {
    match store.get_week_plan(week)? {
        Some(plan) => Ok(plan),
        None => store.create_week_plan(week),
    }
}

/// Copy entries and special days of `source` into a new plan for `target`.
///
/// The source plan must exist and the target week must be valid and still
/// without a plan. Entries keep their slots, gaps included.
pub fn copy_week_plan(
    store: &dyn WeekPlanStore,
    source: CalendarWeek,
    target: CalendarWeek,
) -> StoreResult<WeekPlan> {
    if !target.is_valid() {
        return Err(StoreError::InvalidWeek(target));
    }
    let source_plan = store
        .get_week_plan(source)?
        .ok_or(StoreError::NoPlanForWeek(source))?;
    if store.get_week_plan(target)?.is_some() {
        return Err(StoreError::DuplicateWeekPlan(target));
    }

    let target_plan = store.create_week_plan(target)?;

    let mut entries: Vec<_> = source_plan.entries.iter().collect();
    entries.sort_by_key(|e| (e.day, e.meal, e.slot));
    for entry in entries {
        store.insert_plan_entry_at(
            target_plan.id,
            &NewPlanEntry {
                day: entry.day,
                meal: entry.meal,
                product_id: entry.product_id,
                custom_text: entry.custom_text.clone(),
                group_label: entry.group_label.clone(),
            },
            entry.slot,
        )?;
    }
    for special in &source_plan.special_days {
        store.set_special_day(
            target_plan.id,
            special.day,
            special.kind,
            special.label.as_deref(),
        )?;
    }

    log::info!(
        "Copied {} entries and {} special days from {} to {}",
        source_plan.entries.len(),
        source_plan.special_days.len(),
        source,
        target
    );
    store.get_week_plan_by_id(target_plan.id)
}
