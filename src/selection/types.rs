//! Filter, sort and statistics types for the selection engine.

use serde::{Deserialize, Serialize};

/// Addresses one of the filter bounds in [`Filters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    Search,
    MinFee,
    MaxFee,
    MinVsize,
    MaxVsize,
    MinWeight,
    MaxWeight,
    MinFeeRate,
    MaxFeeRate,
}

/// The active filter bounds, kept as raw operator input.
///
/// Bounds stay strings on purpose: they are validated when the filter is
/// applied, not when typed, so a half-typed or non-numeric bound is simply
/// inactive instead of rejecting every record. An empty string means no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub search: String,
    pub min_fee: String,
    pub max_fee: String,
    pub min_vsize: String,
    pub max_vsize: String,
    pub min_weight: String,
    pub max_weight: String,
    pub min_fee_rate: String,
    pub max_fee_rate: String,
}

impl Filters {
    pub fn set(&mut self, key: FilterKey, value: &str) {
        let slot = match key {
            FilterKey::Search => &mut self.search,
            FilterKey::MinFee => &mut self.min_fee,
            FilterKey::MaxFee => &mut self.max_fee,
            FilterKey::MinVsize => &mut self.min_vsize,
            FilterKey::MaxVsize => &mut self.max_vsize,
            FilterKey::MinWeight => &mut self.min_weight,
            FilterKey::MaxWeight => &mut self.max_weight,
            FilterKey::MinFeeRate => &mut self.min_fee_rate,
            FilterKey::MaxFeeRate => &mut self.max_fee_rate,
        };
        *slot = value.to_string();
    }
}

/// Parses a numeric bound typed by the operator.
///
/// Returns `None` for empty or non-numeric input, which deactivates that
/// half of the range (fail-open).
pub(crate) fn parse_bound(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Attribute a view can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Txid,
    Fee,
    Vsize,
    Weight,
    FeeRate,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active sort: one key, one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// A fresh sort on `key`; first selection of a column starts descending.
    pub fn default_for(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }
}

impl Default for SortSpec {
    /// Highest fee rate first.
    fn default() -> Self {
        Self {
            key: SortKey::FeeRate,
            direction: SortDirection::Descending,
        }
    }
}

/// Aggregates derived from the pool, the visible view and the selection.
///
/// Selected ids with no matching pool record contribute nothing; a stale
/// selection is not an error here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub pool_size: usize,
    pub visible_size: usize,
    pub selected_count: usize,
    /// `selected_count / pool_size`; 0 when the pool is empty.
    pub selection_ratio: f64,
    pub total_fee: u64,
    pub total_vsize: u64,
    pub total_weight: u64,
    /// `total_fee / total_vsize`; 0 when nothing sized is selected.
    pub avg_fee_rate: f64,
}
