//! Memory-budget slider allocator for chat settings panels.
//!
//! A chat assistant's prompt is assembled from eight memory categories
//! (function definitions, two long-term memory tiers, episodic memory,
//! recent turns, notes, the user's input, and room for the output). The
//! settings panel lets a user split a fixed token budget between them by
//! dragging seven handles on a single range slider. `membudget` is that
//! slider's state machine, separated from any rendering:
//!
//! - [`BudgetAllocator`](allocator::BudgetAllocator) holds the boundary
//!   vector and clamps every handle move to a legal position.
//! - [`Breakdown`](breakdown::Breakdown) is the `{absolute, percentage}`
//!   view the panel redraws after every move.
//! - [`EditSession`](session::EditSession) binds an allocator to one user
//!   and round-trips it through a [`SettingsSource`](settings::SettingsSource)
//!   / [`SettingsSink`](settings::SettingsSink).
//!
//! # Example
//!
//! ```
//! use membudget::prelude::*;
//!
//! let store = MemorySettingsStore::new();
//! let panel = PanelConfig::default();
//!
//! let mut session = EditSession::open(&store, "alice", &panel).unwrap();
//! session.move_handle(1, 1200).unwrap();
//! println!("{}", session.breakdown().to_log_string());
//!
//! let saved = session.save(&store).unwrap();
//! assert_eq!(saved.allocation.functions, 1200);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`allocator`] | Boundary vector, clamping, tail coupling |
//! | [`category`] | The eight categories and their flat size mapping |
//! | [`breakdown`] | Per-category absolute/percentage projection |
//! | [`settings`] | Persisted settings, source/sink traits, file and memory stores |
//! | [`session`] | One user's edit: open, move, reset, save |
//! | [`config`] | Panel defaults and fallback split |
//! | [`log`] | Tracing layer feeding the panel's activity log |

pub mod allocator;
pub mod breakdown;
pub mod category;
pub mod config;
pub mod error;
pub mod log;
pub mod prelude;
pub mod session;
pub mod settings;

// Re-export schemars for downstream crates.
pub use schemars;

/// JSON Schema of the flat per-category mapping exchanged with settings
/// stores.
///
/// ```
/// let schema = membudget::category_sizes_schema();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"ltm1".into()));
/// ```
pub fn category_sizes_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(category::CategorySizes);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

/// JSON Schema of a persisted [`UserSettings`](settings::UserSettings) record.
pub fn user_settings_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(settings::UserSettings);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}
