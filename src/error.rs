//! Error types for catalog and week plan operations
//!
//! Errors are classified by how the caller should react:
//! - NotFound: the referenced product, plan or entry is gone (reload)
//! - Conflict: the request clashes with existing data (duplicate name, product in use)
//! - Invalid: the input itself is wrong (unknown allergen code, empty entry)

use thiserror::Error;

use crate::types::WeekDay;
use crate::week::CalendarWeek;

/// Error types for store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // Not found
    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Week plan {0} not found")]
    WeekPlanNotFound(i64),

    #[error("No week plan for {0}")]
    NoPlanForWeek(CalendarWeek),

    #[error("Plan entry {0} not found")]
    EntryNotFound(i64),

    // Conflicts
    #[error("A product named '{0}' already exists")]
    DuplicateProduct(String),

    #[error("A week plan for {0} already exists")]
    DuplicateWeekPlan(CalendarWeek),

    #[error("Product {0} is still used in a week plan")]
    ProductInUse(i64),

    // Invalid input
    #[error("Unknown allergen: {0}")]
    UnknownAllergen(String),

    #[error("Unknown additive: {0}")]
    UnknownAdditive(String),

    #[error("Product name must not be empty")]
    EmptyProductName,

    #[error("Entry on {} needs a product or custom text", .0.display_name())]
    EmptyEntry(WeekDay),

    #[error("{0} is not a valid calendar week")]
    InvalidWeek(CalendarWeek),
}

impl StoreError {
    pub fn error_type(&self) -> ErrorType {
        match self {
            StoreError::ProductNotFound(_)
            | StoreError::WeekPlanNotFound(_)
            | StoreError::NoPlanForWeek(_)
            | StoreError::EntryNotFound(_) => ErrorType::NotFound,
            StoreError::DuplicateProduct(_)
            | StoreError::DuplicateWeekPlan(_)
            | StoreError::ProductInUse(_) => ErrorType::Conflict,
            StoreError::UnknownAllergen(_)
            | StoreError::UnknownAdditive(_)
            | StoreError::EmptyProductName
            | StoreError::EmptyEntry(_)
            | StoreError::InvalidWeek(_) => ErrorType::Invalid,
        }
    }

    /// Returns true if reloading and retrying can succeed without user changes
    pub fn is_retryable(&self) -> bool {
        self.error_type() == ErrorType::NotFound
    }
}

/// Serializable error representation for the frontend
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    NotFound,
    Conflict,
    Invalid,
}

impl From<&StoreError> for CommandError {
    fn from(err: &StoreError) -> Self {
        CommandError {
            message: err.to_string(),
            error_type: err.error_type(),
            can_retry: err.is_retryable(),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::from(&err)
    }
}
