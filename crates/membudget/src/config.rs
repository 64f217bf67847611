//! Settings panel defaults.
//!
//! [`PanelConfig`] holds the budget a user starts with before their first
//! save, the end-category floors, and the default split. When persisted
//! settings are missing or malformed, an edit session falls back to
//! [`PanelConfig::default_settings`].

use crate::allocator::AllocatorConfig;
use crate::category::{CATEGORY_COUNT, Category, CategorySizes};
use crate::settings::UserSettings;

/// Default total budget in tokens.
pub const DEFAULT_MAX_TOKENS: i64 = 8000;

/// Default minimum gap between adjacent handles.
pub const DEFAULT_MIN_TOKENS: i64 = 100;

/// Default split, in percent of the total, in slider order.
const DEFAULT_WEIGHTS: [i64; CATEGORY_COUNT] = [10, 10, 10, 10, 25, 5, 15, 15];

/// Category that absorbs the integer-division remainder of the default split.
const REMAINDER_CATEGORY: Category = Category::Recent;

/// Settings panel configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Budget for users with no saved settings. Default: `8000`.
    pub max_tokens: i64,
    /// Gap for users with no saved settings. Default: `100`.
    pub min_tokens: i64,
    /// Floor for the first category. `None` uses the session's gap.
    pub first_floor: Option<i64>,
    /// Floor for the last category. `None` uses the session's gap.
    pub last_floor: Option<i64>,
    /// Couple the `input`/`output` handles. Default: `true`.
    pub couple_tail: bool,
    /// Default split in percent, slider order. Must sum to 100.
    pub weights: [i64; CATEGORY_COUNT],
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            min_tokens: DEFAULT_MIN_TOKENS,
            first_floor: None,
            last_floor: None,
            couple_tail: true,
            weights: DEFAULT_WEIGHTS,
        }
    }
}

impl PanelConfig {
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_min_tokens(mut self, min_tokens: i64) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    pub fn with_first_floor(mut self, floor: i64) -> Self {
        self.first_floor = Some(floor);
        self
    }

    pub fn with_last_floor(mut self, floor: i64) -> Self {
        self.last_floor = Some(floor);
        self
    }

    pub fn with_tail_coupling(mut self, enabled: bool) -> Self {
        self.couple_tail = enabled;
        self
    }

    /// Allocator constraints for a session with the given budget and gap.
    pub fn allocator_config(&self, total: i64, min_gap: i64) -> AllocatorConfig {
        AllocatorConfig::new(total, min_gap)
            .with_first_floor(self.first_floor.unwrap_or(min_gap))
            .with_last_floor(self.last_floor.unwrap_or(min_gap))
            .with_tail_coupling(self.couple_tail)
    }

    /// Split `total` by the configured weights. The sizes sum exactly to
    /// `total`; the rounding remainder goes to `recent`.
    ///
    /// A weight whose share of a very large `total` would overflow gets
    /// nothing and its tokens land in the remainder.
    pub fn default_sizes(&self, total: i64) -> CategorySizes {
        let weights = self.weights.map(|w| w.max(0));
        let weight_sum = weights
            .iter()
            .try_fold(0i64, |acc, &w| acc.checked_add(w))
            .unwrap_or(0);
        let mut sizes = [0i64; CATEGORY_COUNT];
        if weight_sum > 0 && total > 0 {
            for (size, weight) in sizes.iter_mut().zip(weights) {
                *size = total
                    .checked_mul(weight)
                    .map_or(0, |scaled| scaled / weight_sum);
            }
        }
        // Each share is at most `total * w / sum`, so the assigned sum
        // never exceeds `total`.
        let assigned: i64 = sizes.iter().sum();
        sizes[REMAINDER_CATEGORY.index()] += total.max(0) - assigned;
        CategorySizes::from_array(sizes)
    }

    /// Settings for a user who has never saved.
    pub fn default_settings(&self) -> UserSettings {
        UserSettings {
            max_tokens: self.max_tokens,
            min_tokens: self.min_tokens,
            allocation: self.default_sizes(self.max_tokens),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_sum_to_total() {
        let config = PanelConfig::default();
        for total in [8000, 8001, 12_345, 100_000] {
            assert_eq!(config.default_sizes(total).checked_total(), Some(total));
        }
    }

    #[test]
    fn default_split_matches_weights() {
        let sizes = PanelConfig::default().default_sizes(8000);
        assert_eq!(sizes.functions, 800);
        assert_eq!(sizes.recent, 2000);
        assert_eq!(sizes.notes, 400);
        assert_eq!(sizes.output, 1200);
    }

    #[test]
    fn remainder_goes_to_recent() {
        let sizes = PanelConfig::default().default_sizes(8007);
        assert_eq!(sizes.functions, 800);
        assert_eq!(sizes.input, 1201);
        assert_eq!(sizes.recent, 2001 + 4);
    }

    #[test]
    fn default_sizes_survive_huge_totals() {
        let sizes = PanelConfig::default().default_sizes(i64::MAX);
        assert_eq!(sizes.checked_total(), Some(i64::MAX));
        assert!(sizes.to_array().iter().all(|&s| s >= 0));
    }

    #[test]
    fn allocator_config_defaults_floors_to_gap() {
        let config = PanelConfig::default().allocator_config(8000, 150);
        assert_eq!(config.first_floor, 150);
        assert_eq!(config.last_floor, 150);
        assert!(config.couple_tail);

        let config = PanelConfig::default()
            .with_first_floor(300)
            .with_tail_coupling(false)
            .allocator_config(8000, 150);
        assert_eq!(config.first_floor, 300);
        assert_eq!(config.last_floor, 150);
        assert!(!config.couple_tail);
    }

    #[test]
    fn default_settings_use_panel_budget() {
        let settings = PanelConfig::default()
            .with_max_tokens(16_000)
            .with_min_tokens(200)
            .default_settings();
        assert_eq!(settings.max_tokens, 16_000);
        assert_eq!(settings.min_tokens, 200);
        assert_eq!(settings.allocation.checked_total(), Some(16_000));
    }
}
