//! Error types for the allocator, the settings store, and edit sessions.
//!
//! User drags past a limit are never errors: the allocator clamps them.
//! The variants here cover malformed persisted settings, caller bugs
//! (moving an immovable handle), and store I/O.

use thiserror::Error;

use crate::category::Category;

/// Malformed initial settings. Fatal to allocator initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The total budget must be a positive token count.
    #[error("total budget must be positive, got {0}")]
    NonPositiveTotal(i64),

    /// A gap or floor setting is negative.
    #[error("{name} must be non-negative, got {value}")]
    NegativeSetting { name: &'static str, value: i64 },

    /// A category was given a negative size.
    #[error("category `{category}` has negative size {size}")]
    NegativeSize { category: Category, size: i64 },

    /// Category sizes do not add up to the total.
    #[error("category sizes sum to {sum}, expected {total}")]
    SumMismatch { sum: i64, total: i64 },

    /// Category sizes overflow when summed.
    #[error("category sizes overflow when summed")]
    Overflow,

    /// The per-category floors alone need more than the whole budget.
    #[error("category floors need {required} tokens, budget is {total}")]
    FloorsExceedTotal { required: i64, total: i64 },

    /// The per-category floors overflow when summed.
    #[error("category floors overflow when summed")]
    FloorOverflow,
}

/// Errors returned by [`BudgetAllocator`](crate::allocator::BudgetAllocator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    #[error("invalid budget configuration: {0}")]
    Config(#[from] ConfigError),

    /// The caller asked to move an endpoint or a handle that does not exist.
    #[error("handle {index} is not movable (movable handles are 1..={last})")]
    InvalidHandle { index: i64, last: usize },
}

/// Errors from a [`SettingsSource`](crate::settings::SettingsSource) or
/// [`SettingsSink`](crate::settings::SettingsSink).
#[derive(Debug, Error)]
pub enum StoreError {
    /// User ids become file names, so they are restricted to a safe alphabet.
    #[error("invalid user id {0:?}: expected 1-64 characters of [A-Za-z0-9_-]")]
    InvalidUser(String),

    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings are not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from an [`EditSession`](crate::session::EditSession).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Allocator(#[from] AllocatorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
