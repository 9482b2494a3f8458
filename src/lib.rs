//! Curation workbench for candidate transactions.
//!
//! Owns a pool of immutable transaction records, derives a filtered and
//! sorted view from the active predicates, and maintains a multi-item
//! selection that survives any filter or sort change. The core lives in
//! [`selection::engine`]; [`pool`] provides the record model and the
//! one-shot source boundary that feeds it.

pub mod format;
pub mod pool;
pub mod selection;

pub use pool::{PoolSource, SourceError, SyntheticPoolSource, TxRecord};
pub use selection::{FilterKey, SelectionEngine, SortKey};
