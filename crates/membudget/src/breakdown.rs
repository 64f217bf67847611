//! Display projection of an allocation: absolute size and percentage of the
//! total for every category.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::category::{CATEGORY_COUNT, Category};

/// One category's share of the budget.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Raw size in tokens.
    pub absolute: i64,
    /// `100 * absolute / total`, rounded to two decimal places.
    pub percentage: f64,
}

/// Per-category breakdown of the budget, in slider order.
///
/// Serializes as `{ "<category>": { "absolute": .., "percentage": .. }, .. }`
/// with keys in slider order.
#[derive(Clone, Debug, PartialEq)]
pub struct Breakdown {
    total: i64,
    shares: [CategoryShare; CATEGORY_COUNT],
}

impl Breakdown {
    /// Build a breakdown from sizes in slider order.
    pub fn from_sizes(sizes: &[i64; CATEGORY_COUNT], total: i64) -> Self {
        let shares = sizes.map(|absolute| CategoryShare {
            absolute,
            percentage: percentage_of(absolute, total),
        });
        Self { total, shares }
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn get(&self, category: Category) -> CategoryShare {
        self.shares[category.index()]
    }

    /// Iterate `(category, share)` pairs in slider order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryShare)> + '_ {
        Category::ALL.into_iter().zip(self.shares.iter().copied())
    }

    /// Sum of the absolute sizes. Always equals [`total()`](Self::total)
    /// for a breakdown produced by the allocator.
    pub fn sum_absolute(&self) -> i64 {
        self.shares.iter().map(|s| s.absolute).sum()
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        let parts: Vec<String> = self
            .iter()
            .map(|(category, share)| {
                format!("{category}={} ({:.2}%)", share.absolute, share.percentage)
            })
            .collect();
        format!("budget {}: {}", self.total, parts.join(", "))
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CATEGORY_COUNT))?;
        for (category, share) in self.iter() {
            map.serialize_entry(category.name(), &share)?;
        }
        map.end()
    }
}

/// Percentage of `total`, rounded to two decimals. A zero total yields 0.
fn percentage_of(size: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = 100.0 * size as f64 / total as f64;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_is_twelve_and_a_half_percent() {
        let breakdown = Breakdown::from_sizes(&[1000; CATEGORY_COUNT], 8000);
        for (_, share) in breakdown.iter() {
            assert_eq!(share.absolute, 1000);
            assert!((share.percentage - 12.5).abs() < f64::EPSILON);
        }
        assert_eq!(breakdown.sum_absolute(), 8000);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let breakdown = Breakdown::from_sizes(&[1, 1, 1, 0, 0, 0, 0, 0], 3);
        assert!((breakdown.get(Category::Functions).percentage - 33.33).abs() < 1e-9);
        assert!((breakdown.get(Category::Input).percentage).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_total_yields_zero_percent() {
        assert_eq!(percentage_of(10, 0), 0.0);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let breakdown = Breakdown::from_sizes(&[1000, 1000, 1000, 1000, 1000, 1000, 900, 1100], 8000);
        let json = serde_json::to_string(&breakdown).unwrap();
        assert!(json.starts_with(r#"{"functions":{"absolute":1000,"percentage":12.5}"#));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["output"]["absolute"], 1100);
        assert_eq!(value["input"]["percentage"], 11.25);
    }

    #[test]
    fn log_string_lists_every_category() {
        let breakdown = Breakdown::from_sizes(&[1000; CATEGORY_COUNT], 8000);
        let log = breakdown.to_log_string();
        assert!(log.starts_with("budget 8000:"));
        for category in Category::ALL {
            assert!(log.contains(category.name()));
        }
    }
}
