use anyhow::Result;
use clap::{Parser, ValueEnum};

use mempool_curator::format::{format_btc, format_number};
use mempool_curator::selection::SortSpec;
use mempool_curator::{FilterKey, SelectionEngine, SortKey, SyntheticPoolSource};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortColumn {
    Txid,
    Fee,
    Vsize,
    Weight,
    FeeRate,
    Timestamp,
}

impl From<SortColumn> for SortKey {
    fn from(c: SortColumn) -> Self {
        match c {
            SortColumn::Txid => SortKey::Txid,
            SortColumn::Fee => SortKey::Fee,
            SortColumn::Vsize => SortKey::Vsize,
            SortColumn::Weight => SortKey::Weight,
            SortColumn::FeeRate => SortKey::FeeRate,
            SortColumn::Timestamp => SortKey::Timestamp,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Size of the synthetic pool to generate.
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// Seed for a reproducible pool.
    #[arg(long)]
    seed: Option<u64>,

    /// Select the N highest-fee-rate transactions from the full pool.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Only show transactions at or above this fee rate (sat/vB).
    #[arg(long)]
    min_fee_rate: Option<String>,

    /// Case-insensitive txid substring filter.
    #[arg(long)]
    search: Option<String>,

    /// Column to sort the view by (descending).
    #[arg(long, value_enum, default_value_t = SortColumn::FeeRate)]
    sort: SortColumn,

    /// Number of view rows to print.
    #[arg(long, default_value_t = 15)]
    rows: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut source = SyntheticPoolSource::new(args.count);
    if let Some(seed) = args.seed {
        source = source.with_seed(seed);
    }

    let mut engine = SelectionEngine::new();
    engine.ingest_from(&source).await?;

    if let Some(rate) = &args.min_fee_rate {
        engine.update_filter(FilterKey::MinFeeRate, rate);
    }
    if let Some(search) = &args.search {
        engine.update_filter(FilterKey::Search, search);
    }
    engine.set_sort_spec(SortSpec::default_for(args.sort.into()));
    engine.select_top_by_fee_rate(args.top);

    print_view(&engine, args.rows);
    print_stats(&engine);

    Ok(())
}

fn print_view(engine: &SelectionEngine, rows: usize) {
    println!();
    println!(
        "{:<3} {:<16} {:>12} {:>8} {:>8} {:>10}",
        "", "txid", "fee (sats)", "vsize", "weight", "sat/vB"
    );
    println!("{}", "-".repeat(64));

    for tx in engine.visible().take(rows) {
        let mark = if engine.is_selected(&tx.txid) { "*" } else { "" };
        let short_id = &tx.txid[..tx.txid.len().min(16)];
        println!(
            "{:<3} {:<16} {:>12} {:>8} {:>8} {:>10.2}",
            mark,
            short_id,
            format_number(tx.fee),
            format_number(tx.vsize),
            format_number(tx.weight),
            tx.fee_rate,
        );
    }

    let total = engine.stats().visible_size;
    if total > rows {
        println!("... {} more", total - rows);
    }
}

fn print_stats(engine: &SelectionEngine) {
    let stats = engine.stats();

    println!();
    println!("==================================================");
    println!("                 SELECTION SUMMARY                ");
    println!("==================================================");
    println!("{:<20} {}", "Pool size", format_number(stats.pool_size as u64));
    println!("{:<20} {}", "Visible", format_number(stats.visible_size as u64));
    println!(
        "{:<20} {} ({:.1}% of pool)",
        "Selected",
        format_number(stats.selected_count as u64),
        stats.selection_ratio * 100.0
    );
    println!("--------------------------------------------------");
    println!(
        "{:<20} {} sats ({} BTC)",
        "Total fee",
        format_number(stats.total_fee),
        format_btc(stats.total_fee)
    );
    println!("{:<20} {} vB", "Total vsize", format_number(stats.total_vsize));
    println!("{:<20} {} WU", "Total weight", format_number(stats.total_weight));
    println!("{:<20} {:.2} sat/vB", "Avg fee rate", stats.avg_fee_rate);
    println!("==================================================");
}
