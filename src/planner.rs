//! Week planner view state.
//!
//! Holds the selected calendar week, the plan loaded for it and the last
//! error message. The store is passed into every operation so the state
//! object stays free of backend handles and can be owned by whatever view
//! drives it.

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::services::week_plans;
use crate::store::{StoreResult, WeekPlanStore};
use crate::types::{
    MealType, NewPlanEntry, PlanEntry, PlanEntryUpdate, SpecialDay, SpecialDayKind, WeekDay,
    WeekPlan,
};
use crate::week::{self, CalendarWeek, PLANNING_DAYS};

#[derive(Debug, Clone)]
pub struct WeekPlanner {
    selected: CalendarWeek,
    plan: Option<WeekPlan>,
    error: Option<String>,
}

impl WeekPlanner {
    /// Start on the week containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            selected: CalendarWeek::from_date(today),
            plan: None,
            error: None,
        }
    }

    pub fn selected(&self) -> CalendarWeek {
        self.selected
    }

    pub fn plan(&self) -> Option<&WeekPlan> {
        self.plan.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// "KW 8 2026"
    pub fn title(&self) -> String {
        self.selected.to_string()
    }

    pub fn week_days(&self) -> [NaiveDate; PLANNING_DAYS] {
        self.selected.days()
    }

    /// Column header such as "Montag, 16.02."
    pub fn day_label(&self, day: WeekDay) -> String {
        let date = self.week_days()[day.offset()];
        format!("{}, {}", day.display_name(), week::format_date_short(date))
    }

    pub fn entries_for(&self, day: WeekDay, meal: MealType) -> Vec<&PlanEntry> {
        self.plan
            .as_ref()
            .map(|p| p.entries_for(day, meal))
            .unwrap_or_default()
    }

    pub fn special_day(&self, day: WeekDay) -> Option<&SpecialDay> {
        self.plan.as_ref().and_then(|p| p.special_day(day))
    }

    fn track<T>(&mut self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            log::warn!("Planner operation on {} failed: {}", self.selected, e);
            self.error = Some(e.to_string());
        }
        result
    }

    fn loaded_plan_id(&mut self) -> StoreResult<i64> {
        let result = self
            .plan
            .as_ref()
            .map(|p| p.id)
            .ok_or(StoreError::NoPlanForWeek(self.selected));
        self.track(result)
    }

    /// Entries of other weeks are rejected so the loaded plan stays in
    /// sync with the store.
    fn check_loaded_entry(&mut self, entry_id: i64) -> StoreResult<()> {
        let result = match &self.plan {
            Some(plan) if plan.entries.iter().any(|e| e.id == entry_id) => Ok(()),
            Some(_) => Err(StoreError::EntryNotFound(entry_id)),
            None => Err(StoreError::NoPlanForWeek(self.selected)),
        };
        self.track(result)
    }

    /// Switch to `week` and load its plan. Invalid weeks are rejected and
    /// leave the selection unchanged.
    pub fn select(
        &mut self,
        store: &dyn WeekPlanStore,
        week: CalendarWeek,
    ) -> StoreResult<Option<&WeekPlan>> {
        if !week.is_valid() {
            return self.track(Err(StoreError::InvalidWeek(week)));
        }
        self.selected = week;
        self.load(store)
    }

    pub fn next(&mut self, store: &dyn WeekPlanStore) -> StoreResult<Option<&WeekPlan>> {
        let next = self.selected.next();
        self.select(store, next)
    }

    pub fn prev(&mut self, store: &dyn WeekPlanStore) -> StoreResult<Option<&WeekPlan>> {
        let prev = self.selected.prev();
        self.select(store, prev)
    }

    /// Jump to the week containing `date`.
    pub fn go_to_date(
        &mut self,
        store: &dyn WeekPlanStore,
        date: NaiveDate,
    ) -> StoreResult<Option<&WeekPlan>> {
        self.select(store, CalendarWeek::from_date(date))
    }

    pub fn go_to_current(&mut self, store: &dyn WeekPlanStore) -> StoreResult<Option<&WeekPlan>> {
        self.select(store, week::current_week())
    }

    /// Reload the selected week. A week without a plan loads as `None`.
    pub fn load(&mut self, store: &dyn WeekPlanStore) -> StoreResult<Option<&WeekPlan>> {
        self.error = None;
        let result = store.get_week_plan(self.selected);
        match self.track(result) {
            Ok(plan) => {
                self.plan = plan;
                Ok(self.plan.as_ref())
            }
            Err(e) => {
                self.plan = None;
                Err(e)
            }
        }
    }

    pub fn create(&mut self, store: &dyn WeekPlanStore) -> StoreResult<&WeekPlan> {
        self.error = None;
        let result = store.create_week_plan(self.selected);
        let plan = self.track(result)?;
        Ok(self.plan.insert(plan))
    }

    /// Fill the selected week with a copy of `source`.
    pub fn copy_from(
        &mut self,
        store: &dyn WeekPlanStore,
        source: CalendarWeek,
    ) -> StoreResult<&WeekPlan> {
        self.error = None;
        let result = week_plans::copy_week_plan(store, source, self.selected);
        let plan = self.track(result)?;
        Ok(self.plan.insert(plan))
    }

    pub fn add_entry(
        &mut self,
        store: &dyn WeekPlanStore,
        entry: &NewPlanEntry,
    ) -> StoreResult<PlanEntry> {
        let plan_id = self.loaded_plan_id()?;
        let result = store.add_plan_entry(plan_id, entry);
        let added = self.track(result)?;
        if let Some(plan) = self.plan.as_mut() {
            plan.entries.push(added.clone());
        }
        Ok(added)
    }

    pub fn remove_entry(&mut self, store: &dyn WeekPlanStore, entry_id: i64) -> StoreResult<()> {
        self.check_loaded_entry(entry_id)?;
        let result = store.remove_plan_entry(entry_id);
        self.track(result)?;
        if let Some(plan) = self.plan.as_mut() {
            plan.entries.retain(|e| e.id != entry_id);
        }
        Ok(())
    }

    pub fn update_entry(
        &mut self,
        store: &dyn WeekPlanStore,
        entry_id: i64,
        update: &PlanEntryUpdate,
    ) -> StoreResult<PlanEntry> {
        self.check_loaded_entry(entry_id)?;
        let result = store.update_plan_entry(entry_id, update);
        let updated = self.track(result)?;
        if let Some(plan) = self.plan.as_mut() {
            if let Some(slot) = plan.entries.iter_mut().find(|e| e.id == entry_id) {
                *slot = updated.clone();
            }
        }
        Ok(updated)
    }

    pub fn set_special_day(
        &mut self,
        store: &dyn WeekPlanStore,
        day: WeekDay,
        kind: SpecialDayKind,
        label: Option<&str>,
    ) -> StoreResult<SpecialDay> {
        let plan_id = self.loaded_plan_id()?;
        let result = store.set_special_day(plan_id, day, kind, label);
        let special = self.track(result)?;
        if let Some(plan) = self.plan.as_mut() {
            plan.special_days.retain(|s| s.day != day);
            plan.special_days.push(special.clone());
            plan.special_days.sort_by_key(|s| s.day);
        }
        Ok(special)
    }

    pub fn remove_special_day(&mut self, store: &dyn WeekPlanStore, day: WeekDay) -> StoreResult<()> {
        let plan_id = self.loaded_plan_id()?;
        let result = store.remove_special_day(plan_id, day);
        self.track(result)?;
        if let Some(plan) = self.plan.as_mut() {
            plan.special_days.retain(|s| s.day != day);
        }
        Ok(())
    }
}
