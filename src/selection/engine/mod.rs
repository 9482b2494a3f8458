//! Transaction selection decision engine.
//!
//! This module is the **Functional Core** of the curation workflow. It owns
//! the pool, the active filters and sort, and the selection set, and it
//! derives the visible view and aggregate statistics from them.
//!
//! # Architecture guarantees
//! * **No Network**: ingestion happens through the [`PoolSource`] boundary;
//!   this module never fetches anything itself.
//! * **No implicit reactivity**: every mutating operation ends with an
//!   explicit `recompute()`; consumers observe changes through registered
//!   callbacks, not through framework magic.
//! * **Deterministic**: the visible view is a pure function of
//!   (pool, filters, sort spec); identical inputs always produce the
//!   identical order.

pub mod state;
mod logic;

#[cfg(test)]
mod tests;

pub use state::LoadState;

use std::collections::HashSet;

use crate::pool::record::TxRecord;
use crate::pool::source::{PoolSource, SourceError};
use crate::selection::types::{FilterKey, Filters, SelectionStats, SortKey, SortSpec};

use state::EngineState;

/// Callback fired after each recompute with the fresh aggregates.
type ChangeNotifier = Box<dyn Fn(&SelectionStats)>;

/// The curation "Brain".
///
/// `SelectionEngine` is single-owner, single-threaded state: every mutation
/// runs to completion (including the recompute of the derived view) before
/// anything can be read back, so readers never observe a half-applied change.
pub struct SelectionEngine {
    state: EngineState,
    notifiers: Vec<ChangeNotifier>,
}

impl SelectionEngine {
    /// Creates an engine with no pool, in the `Loading` state.
    pub fn new() -> Self {
        Self {
            state: EngineState::new(),
            notifiers: Vec::new(),
        }
    }

    /// Registers a callback fired after every recompute (builder form).
    pub fn with_change_notifier<F: Fn(&SelectionStats) + 'static>(mut self, f: F) -> Self {
        self.subscribe(f);
        self
    }

    /// Registers a callback fired after every recompute.
    pub fn subscribe<F: Fn(&SelectionStats) + 'static>(&mut self, f: F) {
        self.notifiers.push(Box::new(f));
    }

    // =====================================================================
    // Ingestion
    // =====================================================================

    /// Replaces the pool with a freshly fetched batch and transitions to
    /// `Ready`.
    ///
    /// Selection membership is kept across re-ingestion; ids no longer
    /// backed by a pool record simply stop contributing to statistics
    /// (see [`prune_stale_selections`](Self::prune_stale_selections)).
    pub fn ingest(&mut self, records: Vec<TxRecord>) {
        log::info!("[ENGINE] ingest: {} records", records.len());

        self.state.index_by_txid.clear();
        for (pos, tx) in records.iter().enumerate() {
            if let Some(prev) = self.state.index_by_txid.insert(tx.txid.clone(), pos) {
                log::warn!("[ENGINE] duplicate txid {} at {} and {}", tx.txid, prev, pos);
            }
        }

        self.state.pool = records;
        self.state.load = LoadState::Ready;
        self.recompute();
    }

    /// Records a failed one-shot fetch. The engine keeps whatever state it
    /// had and waits for an external caller to retry with a new `ingest`.
    pub fn ingest_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("[ENGINE] ingestion failed: {}", reason);
        self.state.load = LoadState::Failed(reason);
    }

    /// Runs the one-shot fetch against a [`PoolSource`] and ingests the
    /// result, recording the failure state on error.
    pub async fn ingest_from(&mut self, source: &impl PoolSource) -> Result<(), SourceError> {
        match source.fetch().await {
            Ok(records) => {
                self.ingest(records);
                Ok(())
            }
            Err(e) => {
                self.ingest_failed(e.to_string());
                Err(e)
            }
        }
    }

    // =====================================================================
    // Filters and sorting
    // =====================================================================

    /// Sets one filter bound to the given raw text and recomputes.
    pub fn update_filter(&mut self, key: FilterKey, value: &str) {
        log::debug!("[ENGINE] update_filter: {:?} = {:?}", key, value);
        self.state.filters.set(key, value);
        self.recompute();
    }

    /// Clears every filter bound, restoring the unfiltered view.
    pub fn reset_filters(&mut self) {
        log::debug!("[ENGINE] reset_filters");
        self.state.filters = Filters::default();
        self.recompute();
    }

    /// Selects the active sort key.
    ///
    /// Re-selecting the current key flips the direction; a new key starts
    /// descending.
    pub fn set_sort_key(&mut self, key: SortKey) {
        if self.state.sort.key == key {
            self.state.sort.direction = self.state.sort.direction.flipped();
        } else {
            self.state.sort = SortSpec::default_for(key);
        }
        log::debug!("[ENGINE] set_sort_key: {:?}", self.state.sort);
        self.recompute();
    }

    /// Sets the sort spec directly, with none of the toggle behavior of
    /// [`set_sort_key`](Self::set_sort_key). For drivers that know the
    /// exact order they want rather than reacting to column clicks.
    pub fn set_sort_spec(&mut self, spec: SortSpec) {
        self.state.sort = spec;
        log::debug!("[ENGINE] set_sort_spec: {:?}", spec);
        self.recompute();
    }

    // =====================================================================
    // Selection
    // =====================================================================

    /// Adds the id to the selection if absent, removes it if present.
    pub fn toggle_selection(&mut self, txid: &str) {
        if !self.state.selected.remove(txid) {
            self.state.selected.insert(txid.to_string());
        }
        self.recompute();
    }

    /// Replaces the selection with exactly the ids in the visible view.
    ///
    /// "Select all" is relative to the active filter: what you see is what
    /// you select, not the whole pool.
    pub fn select_all_visible(&mut self) {
        self.state.selected = self
            .state
            .visible
            .iter()
            .map(|&pos| self.state.pool[pos].txid.clone())
            .collect();
        log::debug!("[ENGINE] select_all_visible: {}", self.state.selected.len());
        self.recompute();
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        self.state.selected.clear();
        self.recompute();
    }

    /// Replaces the selection with the `n` highest-fee-rate records from
    /// the **full unfiltered pool**, regardless of the active view.
    ///
    /// `n` is clamped to the pool size; `n == 0` clears the selection.
    pub fn select_top_by_fee_rate(&mut self, n: usize) {
        self.state.selected = logic::top_by_fee_rate(&self.state.pool, n);
        log::debug!(
            "[ENGINE] select_top_by_fee_rate({}): {} selected",
            n,
            self.state.selected.len()
        );
        self.recompute();
    }

    /// Drops selected ids that no longer resolve to a pool record.
    ///
    /// Optional hygiene after re-ingestion; stale ids are harmless either
    /// way since every consumer skips them.
    pub fn prune_stale_selections(&mut self) {
        let index = &self.state.index_by_txid;
        let before = self.state.selected.len();
        self.state.selected.retain(|txid| index.contains_key(txid));
        let dropped = before - self.state.selected.len();
        if dropped > 0 {
            log::info!("[ENGINE] pruned {} stale selections", dropped);
        }
        self.recompute();
    }

    // =====================================================================
    // Read accessors
    // =====================================================================

    /// The full pool in ingestion order.
    pub fn pool(&self) -> &[TxRecord] {
        &self.state.pool
    }

    /// The derived view: filtered then sorted.
    pub fn visible(&self) -> impl Iterator<Item = &TxRecord> + '_ {
        self.state.visible.iter().map(|&pos| &self.state.pool[pos])
    }

    /// Txids of the derived view, in view order.
    pub fn visible_txids(&self) -> Vec<&str> {
        self.state
            .visible
            .iter()
            .map(|&pos| self.state.pool[pos].txid.as_str())
            .collect()
    }

    pub fn selection(&self) -> &HashSet<String> {
        &self.state.selected
    }

    pub fn is_selected(&self, txid: &str) -> bool {
        self.state.selected.contains(txid)
    }

    /// Aggregates over the current (pool, view, selection).
    pub fn stats(&self) -> SelectionStats {
        self.state.stats
    }

    pub fn filters(&self) -> &Filters {
        &self.state.filters
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.state.sort
    }

    pub fn is_loading(&self) -> bool {
        self.state.load.is_loading()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state.load
    }

    // =====================================================================
    // Derivation
    // =====================================================================

    /// Rebuilds the cached view and statistics, then fires the change
    /// notifiers. Called synchronously at the end of every mutation.
    fn recompute(&mut self) {
        self.state.visible = logic::apply_filters(&self.state.pool, &self.state.filters);
        logic::apply_sort(&self.state.pool, &mut self.state.visible, self.state.sort);
        self.state.stats = logic::compute_stats(
            &self.state.pool,
            self.state.visible.len(),
            &self.state.selected,
            &self.state.index_by_txid,
        );

        log::trace!(
            "[ENGINE] recompute: {} visible / {} pool, {} selected",
            self.state.visible.len(),
            self.state.pool.len(),
            self.state.selected.len()
        );

        for notify in &self.notifiers {
            notify(&self.state.stats);
        }
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}
