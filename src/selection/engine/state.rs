use std::collections::{HashMap, HashSet};

use crate::pool::record::TxRecord;
use crate::selection::types::{Filters, SelectionStats, SortSpec};

/// Ingestion lifecycle of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No pool yet; derived state must not be read.
    Loading,
    /// Pool ingested, derived state valid.
    Ready,
    /// The one-shot fetch failed. Stays here until a caller retries
    /// with a fresh `ingest`.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        !matches!(self, LoadState::Ready)
    }
}

#[derive(Debug)]
pub struct EngineState {
    /// The full pool, in ingestion order. Owned here; records are never
    /// mutated after ingest.
    pub pool: Vec<TxRecord>,

    /// txid -> position in `pool`
    pub index_by_txid: HashMap<String, usize>,

    pub filters: Filters,
    pub sort: SortSpec,

    /// Selected txids. Keyed by id, not view position, so membership
    /// survives any filter or sort change.
    pub selected: HashSet<String>,

    /// Cached derived view: positions into `pool`, filtered then sorted.
    pub visible: Vec<usize>,

    /// Cached aggregates, refreshed together with `visible`.
    pub stats: SelectionStats,

    pub load: LoadState,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            pool: Vec::new(),
            index_by_txid: HashMap::new(),
            filters: Filters::default(),
            sort: SortSpec::default(),
            selected: HashSet::new(),
            visible: Vec::new(),
            stats: SelectionStats::default(),
            load: LoadState::Loading,
        }
    }
}
