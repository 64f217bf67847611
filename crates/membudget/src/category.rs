//! The eight memory categories and their flat size mapping.
//!
//! Categories are ordered: the allocator lays them out left to right on a
//! single slider, so [`Category::index()`] is also the position of the
//! category's left boundary in a [`BoundaryVector`](crate::allocator::BoundaryVector).

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of categories sharing the budget.
pub const CATEGORY_COUNT: usize = 8;

/// A named slice of the token budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Function / tool definitions.
    Functions,
    /// Long-term memory, first tier.
    Ltm1,
    /// Long-term memory, second tier.
    Ltm2,
    /// Episodic memory.
    Episodic,
    /// Recent conversation turns.
    Recent,
    /// User notes.
    Notes,
    /// The incoming user message.
    Input,
    /// Room reserved for the model's response.
    Output,
}

impl Category {
    /// All categories in slider order.
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Self::Functions,
        Self::Ltm1,
        Self::Ltm2,
        Self::Episodic,
        Self::Recent,
        Self::Notes,
        Self::Input,
        Self::Output,
    ];

    /// Position of the category on the slider (0-based).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name, identical to the JSON field name in [`CategorySizes`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Ltm1 => "ltm1",
            Self::Ltm2 => "ltm2",
            Self::Episodic => "episodic",
            Self::Recent => "recent",
            Self::Notes => "notes",
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// Human-readable label for panel rows.
    pub fn label(self) -> &'static str {
        match self {
            Self::Functions => "Functions",
            Self::Ltm1 => "Long-term memory 1",
            Self::Ltm2 => "Long-term memory 2",
            Self::Episodic => "Episodic memory",
            Self::Recent => "Recent messages",
            Self::Notes => "Notes",
            Self::Input => "Input",
            Self::Output => "Output",
        }
    }

    /// Look up a category by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category token sizes, in the flat shape exchanged with the settings
/// store: `{functions, ltm1, ltm2, episodic, recent, notes, input, output}`.
///
/// Sizes are signed so malformed persisted values (negative numbers) can be
/// deserialized and then rejected by the allocator with a proper error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategorySizes {
    pub functions: i64,
    pub ltm1: i64,
    pub ltm2: i64,
    pub episodic: i64,
    pub recent: i64,
    pub notes: i64,
    pub input: i64,
    pub output: i64,
}

impl CategorySizes {
    /// Build from sizes in slider order.
    pub fn from_array(sizes: [i64; CATEGORY_COUNT]) -> Self {
        let [functions, ltm1, ltm2, episodic, recent, notes, input, output] = sizes;
        Self {
            functions,
            ltm1,
            ltm2,
            episodic,
            recent,
            notes,
            input,
            output,
        }
    }

    /// Sizes in slider order.
    pub fn to_array(&self) -> [i64; CATEGORY_COUNT] {
        [
            self.functions,
            self.ltm1,
            self.ltm2,
            self.episodic,
            self.recent,
            self.notes,
            self.input,
            self.output,
        ]
    }

    pub fn get(&self, category: Category) -> i64 {
        self.to_array()[category.index()]
    }

    /// Sum of all sizes, or `None` on overflow.
    pub fn checked_total(&self) -> Option<i64> {
        self.to_array()
            .iter()
            .try_fold(0i64, |acc, &size| acc.checked_add(size))
    }
}
