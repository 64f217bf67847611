//! One user's settings-panel edit.
//!
//! An [`EditSession`] owns a single [`BudgetAllocator`] for as long as the
//! panel is open. It is created from a [`SettingsSource`], mutated by handle
//! moves, and committed to a [`SettingsSink`] on save. Nothing about the
//! boundary vector outlives the session; the next session reloads from the
//! store.

use chrono::Utc;
use tracing::{info, warn};

use crate::allocator::{BoundaryVector, BudgetAllocator};
use crate::breakdown::Breakdown;
use crate::category::CategorySizes;
use crate::config::PanelConfig;
use crate::error::{AllocatorError, SessionError};
use crate::settings::{SettingsSink, SettingsSource, UserSettings};

/// Where a session's starting allocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The user's persisted settings.
    Stored,
    /// No settings were stored; the panel defaults were used.
    Default,
    /// Stored settings were malformed; the panel defaults were used.
    Fallback,
}

/// Editable allocation state for one user.
#[derive(Debug, Clone)]
pub struct EditSession {
    user: String,
    panel: PanelConfig,
    allocator: BudgetAllocator,
    origin: Origin,
    dirty: bool,
}

impl EditSession {
    /// Open a session from the user's stored settings.
    ///
    /// Missing settings start from the panel defaults. Settings the
    /// allocator rejects (sizes not summing to the budget, negative sizes,
    /// floors that cannot fit) are logged and replaced by the defaults.
    /// Store failures are returned.
    pub fn open(
        source: &dyn SettingsSource,
        user: &str,
        panel: &PanelConfig,
    ) -> Result<Self, SessionError> {
        let (allocator, origin) = match source.load(user)? {
            Some(settings) => match allocator_from(panel, &settings) {
                Ok(allocator) => (allocator, Origin::Stored),
                Err(e) => {
                    warn!(user, error = %e, "stored settings rejected, using defaults");
                    (allocator_from(panel, &panel.default_settings())?, Origin::Fallback)
                }
            },
            None => (allocator_from(panel, &panel.default_settings())?, Origin::Default),
        };

        info!(user, ?origin, "{}", allocator.derive().to_log_string());

        Ok(Self {
            user: user.to_string(),
            panel: panel.clone(),
            allocator,
            origin,
            dirty: false,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Whether the allocation changed since the session opened or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn total(&self) -> i64 {
        self.allocator.total()
    }

    pub fn min_gap(&self) -> i64 {
        self.allocator.min_gap()
    }

    pub fn boundaries(&self) -> &BoundaryVector {
        self.allocator.boundaries()
    }

    /// Live per-category breakdown for the display surface.
    pub fn breakdown(&self) -> Breakdown {
        self.allocator.derive()
    }

    /// Move one handle (clamped). See [`BudgetAllocator::move_handle`].
    pub fn move_handle(
        &mut self,
        index: usize,
        value: i64,
    ) -> Result<&BoundaryVector, AllocatorError> {
        let before = *self.allocator.boundaries();
        let after = *self.allocator.move_handle(index, value)?;
        if after != before {
            self.dirty = true;
        }
        Ok(self.allocator.boundaries())
    }

    /// Replace the allocation with the panel's default split for this
    /// session's budget.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let sizes = self.panel.default_sizes(self.total());
        let config = self.panel.allocator_config(self.total(), self.min_gap());
        self.allocator = BudgetAllocator::with_config(config, &sizes.to_array())?;
        self.dirty = true;
        info!(user = %self.user, "allocation reset to defaults");
        Ok(())
    }

    /// The flat sizes that [`save`](Self::save) would persist.
    pub fn commit(&self) -> CategorySizes {
        self.allocator.commit()
    }

    /// Commit the allocation and hand it to `sink`, keyed by the user id.
    ///
    /// On failure the session keeps its state and stays dirty so the save
    /// can be retried.
    pub fn save(&mut self, sink: &dyn SettingsSink) -> Result<UserSettings, SessionError> {
        let settings = UserSettings {
            max_tokens: self.total(),
            min_tokens: self.min_gap(),
            allocation: self.commit(),
            updated_at: Some(Utc::now().to_rfc3339()),
        };
        sink.store(&self.user, &settings)?;
        self.dirty = false;
        self.origin = Origin::Stored;
        info!(user = %self.user, "saved {}", self.breakdown().to_log_string());
        Ok(settings)
    }
}

fn allocator_from(
    panel: &PanelConfig,
    settings: &UserSettings,
) -> Result<BudgetAllocator, AllocatorError> {
    let config = panel.allocator_config(settings.max_tokens, settings.min_tokens);
    BudgetAllocator::with_config(config, &settings.allocation.to_array())
}
