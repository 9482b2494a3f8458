#![cfg(test)]
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;

use crate::pool::record::{ConfirmationStatus, TxRecord};
use crate::pool::source::{PoolSource, SourceError};
use crate::selection::engine::{LoadState, SelectionEngine};
use crate::selection::types::{FilterKey, SortDirection, SortKey, SortSpec};

// =========================================================================
// Helpers
// =========================================================================

/// A record with `vsize = weight / 4` and a fee rate of `fee / vsize`.
fn tx(txid: &str, fee: u64, weight: u64, timestamp: i64) -> TxRecord {
    TxRecord::new(
        txid.to_string(),
        fee,
        weight,
        timestamp,
        ConfirmationStatus::Unconfirmed,
        vec![],
        vec![],
    )
}

fn ready_engine(pool: Vec<TxRecord>) -> SelectionEngine {
    let mut engine = SelectionEngine::new();
    engine.ingest(pool);
    engine
}

/// Pool of three with fee rates [10, 50, 30] on ids [aaa, bbb, ccc].
fn three_tx_pool() -> Vec<TxRecord> {
    vec![
        tx("aaa", 1000, 400, 100), // vsize 100, rate 10
        tx("bbb", 5000, 400, 200), // rate 50
        tx("ccc", 3000, 400, 300), // rate 30
    ]
}

struct FailingSource;

#[async_trait]
impl PoolSource for FailingSource {
    async fn fetch(&self) -> Result<Vec<TxRecord>, SourceError> {
        Err(SourceError::Unavailable("feed down".into()))
    }
}

fn selection_of(engine: &SelectionEngine) -> HashSet<String> {
    engine.selection().clone()
}

// =========================================================================
// Filtering
// =========================================================================

#[test]
fn filtered_view_is_a_subsequence_satisfying_bounds() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MinFeeRate, "20");
    // Timestamp ascending matches ingestion order for this pool.
    engine.set_sort_key(SortKey::Timestamp);
    engine.set_sort_key(SortKey::Timestamp);

    let visible = engine.visible_txids();
    assert_eq!(visible, vec!["bbb", "ccc"], "relative pool order kept");
    for tx in engine.visible() {
        assert!(tx.fee_rate >= 20.0);
    }
}

#[test]
fn min_above_max_empties_view_without_error() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MinFee, "1000");
    engine.update_filter(FilterKey::MaxFee, "500");

    assert_eq!(engine.visible().count(), 0);
    assert_eq!(engine.stats().visible_size, 0);
}

#[test]
fn non_numeric_bound_is_fail_open() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MinFee, "not-a-number");

    // A stray keystroke must never empty the view.
    assert_eq!(engine.visible().count(), 3);
}

#[test]
fn search_matches_txid_substring_case_insensitively() {
    let mut engine = ready_engine(vec![
        tx("DEADbeef00", 1000, 400, 0),
        tx("cafebabe11", 1000, 400, 0),
    ]);
    engine.update_filter(FilterKey::Search, "ADBE");

    assert_eq!(engine.visible_txids(), vec!["DEADbeef00"]);
}

#[test]
fn vsize_and_weight_bounds_constrain_the_view() {
    // Weights 400/800/1600 give vsizes 100/200/400.
    let pool = vec![
        tx("aaa", 1000, 400, 0),
        tx("bbb", 1000, 800, 0),
        tx("ccc", 1000, 1600, 0),
    ];

    let mut engine = ready_engine(pool.clone());
    engine.update_filter(FilterKey::MinVsize, "150");
    engine.update_filter(FilterKey::MaxVsize, "300");
    assert_eq!(engine.visible_txids(), vec!["bbb"]);

    let mut engine = ready_engine(pool);
    engine.update_filter(FilterKey::MinWeight, "500");
    assert_eq!(engine.visible().count(), 2);
    engine.update_filter(FilterKey::MaxWeight, "1000");
    assert_eq!(engine.visible_txids(), vec!["bbb"]);
}

#[test]
fn reset_filters_restores_pool_in_original_order() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MaxFeeRate, "15");
    assert_eq!(engine.visible().count(), 1);

    engine.reset_filters();
    engine.set_sort_key(SortKey::Timestamp);
    engine.set_sort_key(SortKey::Timestamp); // ascending == ingestion order here

    assert_eq!(engine.visible_txids(), vec!["aaa", "bbb", "ccc"]);
}

// =========================================================================
// Sorting
// =========================================================================

#[test]
fn default_sort_is_fee_rate_descending() {
    let engine = ready_engine(three_tx_pool());
    assert_eq!(engine.sort_spec().key, SortKey::FeeRate);
    assert_eq!(engine.sort_spec().direction, SortDirection::Descending);
    assert_eq!(engine.visible_txids(), vec!["bbb", "ccc", "aaa"]);
}

#[test]
fn reselecting_the_sort_key_flips_direction() {
    let mut engine = ready_engine(three_tx_pool());
    engine.set_sort_key(SortKey::FeeRate);
    assert_eq!(engine.sort_spec().direction, SortDirection::Ascending);
    assert_eq!(engine.visible_txids(), vec!["aaa", "ccc", "bbb"]);

    engine.set_sort_key(SortKey::Fee);
    assert_eq!(engine.sort_spec().direction, SortDirection::Descending);
}

#[test]
fn equal_keys_break_ties_on_txid_ascending() {
    // Same fee everywhere; order must not depend on ingestion order.
    let mut a = ready_engine(vec![
        tx("zzz", 1000, 400, 0),
        tx("mmm", 1000, 400, 0),
        tx("aaa", 1000, 400, 0),
    ]);
    a.set_sort_key(SortKey::Fee);
    a.set_sort_key(SortKey::Fee); // ascending

    let mut b = ready_engine(vec![
        tx("aaa", 1000, 400, 0),
        tx("zzz", 1000, 400, 0),
        tx("mmm", 1000, 400, 0),
    ]);
    b.set_sort_key(SortKey::Fee);
    b.set_sort_key(SortKey::Fee);

    assert_eq!(a.visible_txids(), vec!["aaa", "mmm", "zzz"]);
    assert_eq!(a.visible_txids(), b.visible_txids());
}

#[test]
fn set_sort_spec_applies_exactly_without_toggling() {
    let mut engine = ready_engine(three_tx_pool());

    // Same key as the current spec: the direction must be taken as given,
    // not flipped the way a column click would.
    engine.set_sort_spec(SortSpec::default_for(SortKey::FeeRate));
    assert_eq!(engine.sort_spec().direction, SortDirection::Descending);
    assert_eq!(engine.visible_txids(), vec!["bbb", "ccc", "aaa"]);

    engine.set_sort_spec(SortSpec {
        key: SortKey::Fee,
        direction: SortDirection::Ascending,
    });
    assert_eq!(engine.visible_txids(), vec!["aaa", "ccc", "bbb"]);
}

#[test]
fn sorting_twice_is_a_no_op() {
    let mut engine = ready_engine(three_tx_pool());
    engine.set_sort_key(SortKey::Fee);
    let first = engine.visible_txids().join(",");

    // Flip twice to land on the same spec again.
    engine.set_sort_key(SortKey::Fee);
    engine.set_sort_key(SortKey::Fee);
    assert_eq!(engine.visible_txids().join(","), first);
}

// =========================================================================
// Selection
// =========================================================================

#[test]
fn toggle_is_its_own_inverse() {
    let mut engine = ready_engine(three_tx_pool());

    engine.toggle_selection("bbb");
    assert!(engine.is_selected("bbb"));
    engine.toggle_selection("bbb");
    assert!(!engine.is_selected("bbb"));

    // Holds for ids the pool has never seen, too.
    engine.toggle_selection("ghost");
    engine.toggle_selection("ghost");
    assert!(engine.selection().is_empty());
}

#[test]
fn select_all_visible_matches_the_view_exactly() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MinFeeRate, "20");
    engine.select_all_visible();

    let visible: HashSet<String> =
        engine.visible_txids().iter().map(|s| s.to_string()).collect();
    assert_eq!(selection_of(&engine), visible);
    assert_eq!(engine.selection().len(), 2);

    // Empty view => empty selection.
    engine.update_filter(FilterKey::MinFeeRate, "9999");
    engine.select_all_visible();
    assert!(engine.selection().is_empty());
}

#[test]
fn selection_survives_filter_and_sort_changes() {
    let mut engine = ready_engine(three_tx_pool());
    engine.toggle_selection("aaa");
    engine.toggle_selection("ccc");

    engine.update_filter(FilterKey::MinFeeRate, "45"); // hides aaa and ccc
    engine.set_sort_key(SortKey::Weight);

    let expected: HashSet<String> = ["aaa", "ccc"].iter().map(|s| s.to_string()).collect();
    assert_eq!(selection_of(&engine), expected);
}

#[test]
fn clear_selection_empties_unconditionally() {
    let mut engine = ready_engine(three_tx_pool());
    engine.select_all_visible();
    engine.clear_selection();
    assert!(engine.selection().is_empty());

    engine.clear_selection();
    assert!(engine.selection().is_empty());
}

#[test]
fn top_by_fee_rate_ignores_the_active_filter() {
    let mut engine = ready_engine(three_tx_pool());
    engine.update_filter(FilterKey::MaxFeeRate, "15"); // view is just aaa

    engine.select_top_by_fee_rate(2);
    let expected: HashSet<String> = ["bbb", "ccc"].iter().map(|s| s.to_string()).collect();
    assert_eq!(selection_of(&engine), expected);
}

#[test]
fn top_by_fee_rate_clamps_n() {
    let mut engine = ready_engine(three_tx_pool());

    engine.select_top_by_fee_rate(100);
    assert_eq!(engine.selection().len(), 3);

    engine.select_top_by_fee_rate(0);
    assert!(engine.selection().is_empty());
}

#[test]
fn top_by_fee_rate_picks_the_highest_rates() {
    let pool: Vec<TxRecord> = (0..20)
        .map(|i| tx(&format!("{i:02x}"), 1000 + i * 37, 400, 0))
        .collect();
    let mut engine = ready_engine(pool);
    engine.select_top_by_fee_rate(5);

    let min_selected = engine
        .pool()
        .iter()
        .filter(|t| engine.is_selected(&t.txid))
        .map(|t| t.fee_rate)
        .fold(f64::INFINITY, f64::min);
    let max_unselected = engine
        .pool()
        .iter()
        .filter(|t| !engine.is_selected(&t.txid))
        .map(|t| t.fee_rate)
        .fold(f64::NEG_INFINITY, f64::max);

    assert_eq!(engine.selection().len(), 5);
    assert!(min_selected >= max_unselected);
}

// =========================================================================
// Statistics
// =========================================================================

#[test]
fn stats_sum_over_the_selection() {
    // aaa: fee 1000, vsize 200; bbb: fee 3000, vsize 400.
    let mut engine = ready_engine(vec![
        tx("aaa", 1000, 800, 0),
        tx("bbb", 3000, 1600, 0),
        tx("ccc", 9999, 400, 0),
    ]);
    engine.toggle_selection("aaa");
    engine.toggle_selection("bbb");

    let stats = engine.stats();
    assert_eq!(stats.total_fee, 4000);
    assert_eq!(stats.total_vsize, 600);
    assert_eq!(stats.total_weight, 2400);
    assert!((stats.avg_fee_rate - 4000.0 / 600.0).abs() < 1e-9);
    assert!((stats.selection_ratio - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn stats_are_zero_guarded_when_nothing_is_selected() {
    let engine = ready_engine(three_tx_pool());
    let stats = engine.stats();
    assert_eq!(stats.selected_count, 0);
    assert_eq!(stats.avg_fee_rate, 0.0);
    assert_eq!(stats.selection_ratio, 0.0);

    let empty = SelectionEngine::new();
    assert_eq!(empty.stats().selection_ratio, 0.0);
}

#[test]
fn stale_selected_ids_are_skipped_and_prunable() {
    let mut engine = ready_engine(three_tx_pool());
    engine.toggle_selection("aaa");
    engine.toggle_selection("bbb");

    // Re-ingest a pool that no longer contains bbb.
    engine.ingest(vec![tx("aaa", 1000, 400, 100)]);

    let stats = engine.stats();
    assert_eq!(stats.selected_count, 2, "membership itself is kept");
    assert_eq!(stats.total_fee, 1000, "stale id contributes nothing");

    engine.prune_stale_selections();
    let expected: HashSet<String> = ["aaa".to_string()].into_iter().collect();
    assert_eq!(selection_of(&engine), expected);
}

// =========================================================================
// Lifecycle and observation
// =========================================================================

#[test]
fn ingest_transitions_loading_to_ready() {
    let mut engine = SelectionEngine::new();
    assert!(engine.is_loading());
    assert_eq!(*engine.load_state(), LoadState::Loading);

    engine.ingest(three_tx_pool());
    assert!(!engine.is_loading());
    assert_eq!(*engine.load_state(), LoadState::Ready);
}

#[tokio::test]
async fn failed_fetch_surfaces_an_error_state() {
    let mut engine = SelectionEngine::new();
    let result = engine.ingest_from(&FailingSource).await;

    assert!(result.is_err());
    assert!(engine.is_loading());
    assert!(matches!(engine.load_state(), LoadState::Failed(_)));

    // A later successful ingest recovers.
    engine.ingest(three_tx_pool());
    assert_eq!(*engine.load_state(), LoadState::Ready);
}

#[test]
fn change_notifier_fires_after_every_mutation() {
    let fired = Rc::new(Cell::new(0usize));
    let seen = Rc::new(Cell::new(0usize));

    let mut engine = SelectionEngine::new().with_change_notifier({
        let fired = Rc::clone(&fired);
        let seen = Rc::clone(&seen);
        move |stats| {
            fired.set(fired.get() + 1);
            seen.set(stats.selected_count);
        }
    });

    engine.ingest(three_tx_pool());
    engine.toggle_selection("aaa");
    engine.set_sort_key(SortKey::Fee);

    assert_eq!(fired.get(), 3);
    assert_eq!(seen.get(), 1);
}
