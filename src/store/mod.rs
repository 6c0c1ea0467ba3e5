//! Storage seams for the product catalog and week plans.
//!
//! The planner never talks to a backend directly. Everything goes through
//! [`ProductStore`] and [`WeekPlanStore`], so the host process can plug in
//! whatever persistence it uses. [`MemoryStore`] is the in-process
//! implementation used by the binary and the tests.

use crate::error::StoreError;
use crate::types::{
    Additive, Allergen, NewPlanEntry, PlanEntry, PlanEntryUpdate, Product, ProductDraft,
    SpecialDay, SpecialDayKind, WeekDay, WeekPlan,
};
use crate::week::CalendarWeek;

pub mod memory;
pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait ProductStore {
    /// All products ordered by name, with allergens and additives resolved.
    fn list_products(&self) -> StoreResult<Vec<Product>>;

    fn get_product(&self, id: i64) -> StoreResult<Product>;

    fn find_product_by_name(&self, name: &str) -> StoreResult<Option<Product>>;

    fn create_product(&self, draft: &ProductDraft) -> StoreResult<Product>;

    /// Replaces name, multiline flag and both code lists.
    fn update_product(&self, id: i64, draft: &ProductDraft) -> StoreResult<Product>;

    /// Fails with [`StoreError::ProductInUse`] while a plan entry references it.
    fn delete_product(&self, id: i64) -> StoreResult<()>;

    /// Allergens ordered by id.
    fn list_allergens(&self) -> StoreResult<Vec<Allergen>>;

    /// Additives ordered by id.
    fn list_additives(&self) -> StoreResult<Vec<Additive>>;

    /// Insert unless the id exists. Returns whether a row was added.
    fn insert_allergen(&self, allergen: Allergen) -> StoreResult<bool>;

    /// Insert unless the id exists. Returns whether a row was added.
    fn insert_additive(&self, additive: Additive) -> StoreResult<bool>;
}

pub trait WeekPlanStore {
    /// The plan for `week`, or `None` if none was created yet.
    fn get_week_plan(&self, week: CalendarWeek) -> StoreResult<Option<WeekPlan>>;

    fn get_week_plan_by_id(&self, id: i64) -> StoreResult<WeekPlan>;

    /// Creates an empty plan. At most one plan exists per week.
    fn create_week_plan(&self, week: CalendarWeek) -> StoreResult<WeekPlan>;

    /// Appends the entry after the last slot of its day and meal.
    fn add_plan_entry(&self, week_plan_id: i64, entry: &NewPlanEntry) -> StoreResult<PlanEntry>;

    /// Inserts the entry at an explicit slot, used when copying plans.
    fn insert_plan_entry_at(
        &self,
        week_plan_id: i64,
        entry: &NewPlanEntry,
        slot: u32,
    ) -> StoreResult<PlanEntry>;

    fn update_plan_entry(&self, id: i64, update: &PlanEntryUpdate) -> StoreResult<PlanEntry>;

    fn remove_plan_entry(&self, id: i64) -> StoreResult<()>;

    /// Marks `day` as a holiday or closing day, replacing any previous marker.
    fn set_special_day(
        &self,
        week_plan_id: i64,
        day: WeekDay,
        kind: SpecialDayKind,
        label: Option<&str>,
    ) -> StoreResult<SpecialDay>;

    fn remove_special_day(&self, week_plan_id: i64, day: WeekDay) -> StoreResult<()>;
}
