//! Selection state: filters, sorting, the selection set and the engine
//! that derives the visible view from them.

pub mod engine;
pub mod types;

pub use engine::{LoadState, SelectionEngine};
pub use types::{FilterKey, Filters, SelectionStats, SortDirection, SortKey, SortSpec};
