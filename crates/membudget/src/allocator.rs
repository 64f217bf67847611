//! Multi-handle budget allocator.
//!
//! The budget `T` is laid out on one slider as [`CATEGORY_COUNT`] adjacent
//! ranges. Their edges form a [`BoundaryVector`] `b[0..=8]` with `b[0] = 0`
//! and `b[8] = T` fixed; the seven interior edges are the draggable handles.
//! Category `i` owns `b[i+1] - b[i]` tokens, so the sizes always sum to `T`.
//!
//! Moves are never rejected for being out of range. A requested position is
//! clamped to the nearest legal one:
//!
//! - every category keeps at least `min_gap` tokens;
//! - the first category keeps at least `first_floor`, the last at least
//!   `last_floor` (both default to `min_gap`);
//! - the last two handles (`input`/`output` edges) are coupled: dragging the
//!   lower one forward pushes the upper one along, dragging the upper one
//!   backward pulls the lower one along. The cascade stops at the partner.
//!
//! A layout loaded from storage may already violate a floor. The legal range
//! for a handle always includes its current position, so a move can leave
//! such a category as it is but never shrink it further.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::breakdown::Breakdown;
use crate::category::{CATEGORY_COUNT, Category, CategorySizes};
use crate::error::{AllocatorError, ConfigError};

/// Number of boundaries: one per category edge, endpoints included.
pub const BOUNDARY_COUNT: usize = CATEGORY_COUNT + 1;

/// Index of the first movable handle.
const FIRST_HANDLE: usize = 1;

/// Index of the last movable handle.
const LAST_HANDLE: usize = CATEGORY_COUNT - 1;

/// Ordered category edges: `0 = b[0] <= b[1] <= .. <= b[8] = T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryVector([i64; BOUNDARY_COUNT]);

impl BoundaryVector {
    /// Cumulative boundaries from sizes: `b[i] = s[0] + .. + s[i-1]`.
    fn from_sizes(sizes: &[i64; CATEGORY_COUNT]) -> Self {
        let mut bounds = [0i64; BOUNDARY_COUNT];
        for (i, size) in sizes.iter().enumerate() {
            bounds[i + 1] = bounds[i] + size;
        }
        Self(bounds)
    }

    pub fn as_array(&self) -> &[i64; BOUNDARY_COUNT] {
        &self.0
    }

    /// Category sizes in slider order.
    pub fn sizes(&self) -> [i64; CATEGORY_COUNT] {
        std::array::from_fn(|i| self.0[i + 1] - self.0[i])
    }

    /// The fixed upper endpoint.
    pub fn total(&self) -> i64 {
        self.0[CATEGORY_COUNT]
    }

    /// Ordering and endpoint check.
    fn is_well_formed(&self, total: i64) -> bool {
        self.0[0] == 0
            && self.0[CATEGORY_COUNT] == total
            && self.0.windows(2).all(|w| w[0] <= w[1])
    }
}

impl Index<usize> for BoundaryVector {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        &self.0[index]
    }
}

/// Budget and constraint settings for a [`BudgetAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Total budget `T` in tokens.
    pub total: i64,
    /// Minimum size `G` of every category between the two ends.
    pub min_gap: i64,
    /// Minimum size of the first category (lower clamp of handle 1).
    pub first_floor: i64,
    /// Minimum size of the last category (upper clamp of handle 7).
    pub last_floor: i64,
    /// Couple the last two handles so they push/pull each other.
    pub couple_tail: bool,
}

impl AllocatorConfig {
    /// Config with both end floors equal to `min_gap` and tail coupling on.
    pub fn new(total: i64, min_gap: i64) -> Self {
        Self {
            total,
            min_gap,
            first_floor: min_gap,
            last_floor: min_gap,
            couple_tail: true,
        }
    }

    pub fn with_first_floor(mut self, floor: i64) -> Self {
        self.first_floor = floor;
        self
    }

    pub fn with_last_floor(mut self, floor: i64) -> Self {
        self.last_floor = floor;
        self
    }

    pub fn with_tail_coupling(mut self, enabled: bool) -> Self {
        self.couple_tail = enabled;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.total <= 0 {
            return Err(ConfigError::NonPositiveTotal(self.total));
        }
        for (name, value) in [
            ("min_gap", self.min_gap),
            ("first_floor", self.first_floor),
            ("last_floor", self.last_floor),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeSetting { name, value });
            }
        }
        let required = self.required_floor().ok_or(ConfigError::FloorOverflow)?;
        if required > self.total {
            return Err(ConfigError::FloorsExceedTotal {
                required,
                total: self.total,
            });
        }
        Ok(())
    }

    /// Tokens the floors claim before anything is distributed:
    /// `first_floor + last_floor + 6 * min_gap`.
    fn required_floor(&self) -> Option<i64> {
        let interior = i64::try_from(CATEGORY_COUNT - 2).ok()?;
        self.min_gap
            .checked_mul(interior)?
            .checked_add(self.first_floor)?
            .checked_add(self.last_floor)
    }
}

/// Editable allocation state for one settings session.
///
/// # Example
///
/// ```
/// use membudget::allocator::BudgetAllocator;
///
/// let mut alloc = BudgetAllocator::init(8000, 100, &[1000; 8]).unwrap();
/// let bounds = alloc.move_handle(6, 7950).unwrap();
/// assert_eq!(bounds[6], 7800);
/// assert_eq!(bounds[7], 7900);
/// assert_eq!(alloc.commit().output, 100);
/// ```
#[derive(Clone, Debug)]
pub struct BudgetAllocator {
    config: AllocatorConfig,
    bounds: BoundaryVector,
}

impl BudgetAllocator {
    /// Create an allocator with default floors and tail coupling.
    ///
    /// Fails with [`ConfigError`] if any size is negative, the sizes do not
    /// sum to `total`, or the floors alone need more than `total`.
    pub fn init(
        total: i64,
        min_gap: i64,
        sizes: &[i64; CATEGORY_COUNT],
    ) -> Result<Self, AllocatorError> {
        Self::with_config(AllocatorConfig::new(total, min_gap), sizes)
    }

    /// Create an allocator from an explicit config.
    pub fn with_config(
        config: AllocatorConfig,
        sizes: &[i64; CATEGORY_COUNT],
    ) -> Result<Self, AllocatorError> {
        config.validate()?;

        for (category, &size) in Category::ALL.into_iter().zip(sizes) {
            if size < 0 {
                return Err(ConfigError::NegativeSize { category, size }.into());
            }
        }
        let sum = CategorySizes::from_array(*sizes)
            .checked_total()
            .ok_or(ConfigError::Overflow)?;
        if sum != config.total {
            return Err(ConfigError::SumMismatch {
                sum,
                total: config.total,
            }
            .into());
        }

        Ok(Self {
            config,
            bounds: BoundaryVector::from_sizes(sizes),
        })
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn total(&self) -> i64 {
        self.config.total
    }

    pub fn min_gap(&self) -> i64 {
        self.config.min_gap
    }

    /// Current boundary vector.
    pub fn boundaries(&self) -> &BoundaryVector {
        &self.bounds
    }

    /// Move handle `index` toward `proposed`, clamping to the legal range.
    ///
    /// Only handles `1..=7` are movable; the endpoints and out-of-range
    /// indices fail with [`AllocatorError::InvalidHandle`]. Moving a handle
    /// to its current position changes nothing.
    pub fn move_handle(
        &mut self,
        index: usize,
        proposed: i64,
    ) -> Result<&BoundaryVector, AllocatorError> {
        if !(FIRST_HANDLE..=LAST_HANDLE).contains(&index) {
            return Err(AllocatorError::InvalidHandle {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                last: LAST_HANDLE,
            });
        }

        let current = self.bounds[index];
        let (lo, hi) = self.handle_range(index);
        // Widen to include the current position so a pre-existing floor
        // violation can never make the range empty.
        let value = proposed.clamp(lo.min(current), hi.max(current));
        if value != proposed {
            debug!(index, proposed, value, "clamped handle move");
        }
        self.bounds.0[index] = value;

        if let Some((lower, upper)) = self.coupled_pair() {
            let gap = self.config.min_gap;
            let pushed = value.saturating_add(gap);
            let pulled = value.saturating_sub(gap);
            if index == lower && value > current && self.bounds[upper] < pushed {
                debug!(from = self.bounds[upper], to = pushed, "pushed handle {upper}");
                self.bounds.0[upper] = pushed;
            } else if index == upper && value < current && self.bounds[lower] > pulled {
                debug!(from = self.bounds[lower], to = pulled, "pulled handle {lower}");
                self.bounds.0[lower] = pulled;
            }
        }

        self.check_invariants();
        Ok(&self.bounds)
    }

    /// Per-category absolute sizes and percentages of the total.
    pub fn derive(&self) -> Breakdown {
        Breakdown::from_sizes(&self.bounds.sizes(), self.config.total)
    }

    /// Flat per-category sizes for hand-off to a settings sink.
    pub fn commit(&self) -> CategorySizes {
        CategorySizes::from_array(self.bounds.sizes())
    }

    /// The `(lower, upper)` coupled tail handles, if coupling applies.
    fn coupled_pair(&self) -> Option<(usize, usize)> {
        (self.config.couple_tail && LAST_HANDLE > FIRST_HANDLE)
            .then_some((LAST_HANDLE - 1, LAST_HANDLE))
    }

    /// Minimum size of the category just below handle `index`.
    fn floor_below(&self, index: usize) -> i64 {
        if index == FIRST_HANDLE {
            self.config.first_floor
        } else {
            self.config.min_gap
        }
    }

    /// Minimum size of the category just above handle `index`.
    fn floor_above(&self, index: usize) -> i64 {
        if index == LAST_HANDLE {
            self.config.last_floor
        } else {
            self.config.min_gap
        }
    }

    /// Legal `[lo, hi]` for handle `index` before widening to its current
    /// position. For coupled handles the partner's room is folded in.
    ///
    /// Saturating: with `total` near `i64::MAX` the sums leave the range,
    /// and the widening step already copes with `lo > hi`.
    fn handle_range(&self, index: usize) -> (i64, i64) {
        let b = &self.bounds;
        let gap = self.config.min_gap;
        let end = b[BOUNDARY_COUNT - 1];

        match self.coupled_pair() {
            Some((lower, _)) if index == lower => (
                b[lower - 1].saturating_add(self.floor_below(lower)),
                end.saturating_sub(self.config.last_floor).saturating_sub(gap),
            ),
            Some((lower, upper)) if index == upper => (
                b[lower - 1]
                    .saturating_add(self.floor_below(lower))
                    .saturating_add(gap),
                end.saturating_sub(self.config.last_floor),
            ),
            _ => (
                b[index - 1].saturating_add(self.floor_below(index)),
                b[index + 1].saturating_sub(self.floor_above(index)),
            ),
        }
    }

    fn check_invariants(&self) {
        let ok = self.bounds.is_well_formed(self.config.total)
            && self.bounds.sizes().iter().sum::<i64>() == self.config.total;
        if !ok {
            error!(bounds = ?self.bounds, "allocator invariant violated");
        }
        debug_assert!(ok, "allocator invariant violated: {:?}", self.bounds);
    }
}
