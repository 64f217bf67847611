//! Convenience re-exports for common `membudget` types.
//!
//! ```ignore
//! use membudget::prelude::*;
//! ```

pub use crate::allocator::{AllocatorConfig, BOUNDARY_COUNT, BoundaryVector, BudgetAllocator};
pub use crate::breakdown::{Breakdown, CategoryShare};
pub use crate::category::{CATEGORY_COUNT, Category, CategorySizes};
pub use crate::config::PanelConfig;
pub use crate::error::{AllocatorError, ConfigError, SessionError, StoreError};
pub use crate::log::{LogBuffer, LogLine, PanelTracingLayer};
pub use crate::session::{EditSession, Origin};
pub use crate::settings::{
    FileSettingsStore, MemorySettingsStore, SettingsSink, SettingsSource, SettingsStore,
    UserSettings,
};
