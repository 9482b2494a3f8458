//! Pure derivation logic: filtering, ordering, top-N ranking and
//! aggregate statistics.
//!
//! Everything here operates on positions into the pool slice and never
//! mutates a record. Given the same pool, filters and sort spec, the output
//! is always identical.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::pool::record::TxRecord;
use crate::selection::types::{parse_bound, Filters, SelectionStats, SortDirection, SortKey, SortSpec};

/// Returns the positions of pool records passing every active bound,
/// preserving pool order (stable filter).
///
/// Bounds are ANDed: a record passes iff all nine constraints hold. The
/// text filter is a case-insensitive substring match on the txid; numeric
/// bounds that fail to parse are inactive, so bad input widens the view
/// instead of emptying it.
pub fn apply_filters(pool: &[TxRecord], filters: &Filters) -> Vec<usize> {
    let search = filters.search.trim().to_lowercase();

    let min_fee = parse_bound(&filters.min_fee);
    let max_fee = parse_bound(&filters.max_fee);
    let min_vsize = parse_bound(&filters.min_vsize);
    let max_vsize = parse_bound(&filters.max_vsize);
    let min_weight = parse_bound(&filters.min_weight);
    let max_weight = parse_bound(&filters.max_weight);
    let min_fee_rate = parse_bound(&filters.min_fee_rate);
    let max_fee_rate = parse_bound(&filters.max_fee_rate);

    let in_range = |value: f64, min: Option<f64>, max: Option<f64>| {
        min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
    };

    pool.iter()
        .enumerate()
        .filter(|(_, tx)| {
            (search.is_empty() || tx.txid.to_lowercase().contains(&search))
                && in_range(tx.fee as f64, min_fee, max_fee)
                && in_range(tx.vsize as f64, min_vsize, max_vsize)
                && in_range(tx.weight as f64, min_weight, max_weight)
                && in_range(tx.fee_rate, min_fee_rate, max_fee_rate)
        })
        .map(|(pos, _)| pos)
        .collect()
}

/// Orders `visible` per the sort spec.
///
/// The direction flips the primary comparison only; equal keys fall back to
/// txid ascending so the resulting order is total and identical across runs,
/// whatever order filtering produced.
pub fn apply_sort(pool: &[TxRecord], visible: &mut [usize], spec: SortSpec) {
    visible.sort_by(|&a, &b| {
        let (ta, tb) = (&pool[a], &pool[b]);
        let primary = compare_key(ta, tb, spec.key);
        let primary = match spec.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| ta.txid.cmp(&tb.txid))
    });
}

fn compare_key(a: &TxRecord, b: &TxRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Txid => a.txid.cmp(&b.txid),
        SortKey::Fee => a.fee.cmp(&b.fee),
        SortKey::Vsize => a.vsize.cmp(&b.vsize),
        SortKey::Weight => a.weight.cmp(&b.weight),
        SortKey::FeeRate => a.fee_rate.total_cmp(&b.fee_rate),
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
    }
}

/// Picks the `n` highest-fee-rate txids from the full pool.
///
/// Ignores filters and the active sort entirely. `n` is clamped to the pool
/// size; ties keep pool order (stable sort on fee rate alone).
pub fn top_by_fee_rate(pool: &[TxRecord], n: usize) -> HashSet<String> {
    let n = n.min(pool.len());
    if n == 0 {
        return HashSet::new();
    }

    let mut ranked: Vec<usize> = (0..pool.len()).collect();
    ranked.sort_by(|&a, &b| pool[b].fee_rate.total_cmp(&pool[a].fee_rate));

    ranked[..n]
        .iter()
        .map(|&pos| pool[pos].txid.clone())
        .collect()
}

/// Sums fee, vsize and weight across selected records.
///
/// Selected ids absent from the pool are skipped rather than treated as an
/// error; a re-ingested pool may simply no longer contain them.
pub fn compute_stats(
    pool: &[TxRecord],
    visible_size: usize,
    selected: &HashSet<String>,
    index_by_txid: &std::collections::HashMap<String, usize>,
) -> SelectionStats {
    let mut total_fee = 0u64;
    let mut total_vsize = 0u64;
    let mut total_weight = 0u64;

    for txid in selected {
        if let Some(&pos) = index_by_txid.get(txid) {
            let tx = &pool[pos];
            total_fee += tx.fee;
            total_vsize += tx.vsize;
            total_weight += tx.weight;
        }
    }

    let avg_fee_rate = if total_vsize > 0 {
        total_fee as f64 / total_vsize as f64
    } else {
        0.0
    };

    let selection_ratio = if pool.is_empty() {
        0.0
    } else {
        selected.len() as f64 / pool.len() as f64
    };

    SelectionStats {
        pool_size: pool.len(),
        visible_size,
        selected_count: selected.len(),
        selection_ratio,
        total_fee,
        total_vsize,
        total_weight,
        avg_fee_rate,
    }
}
