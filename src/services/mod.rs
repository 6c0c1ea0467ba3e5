//! Business logic on top of the store traits, shared by the planner and
//! the export.

pub mod products;
pub mod week_plans;
