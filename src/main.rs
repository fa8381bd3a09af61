//! Multi-symbol limit order market simulator.
//!
//! Wires the matching engine ([`engine`]), trader agents ([`traders`]),
//! and CSV import/export ([`market_io`]) behind a small CLI, the way the
//! teacher's `cli` + root `src/main.rs` pair wired the exchange service
//! behind HTTP. There's no network surface here - everything runs
//! in-process on the caller's machine.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use engine::{EngineConfig, MatchingEngine};
use market_io::{book_snapshot_to_csv, export_all_trades};
use matching_core::Side;
use traders::{TraderAgent, TraderConfig};

mod latency_test;

#[derive(Parser)]
#[command(name = "sim")]
#[command(about = "Multi-symbol limit order market simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scripted walkthrough of a cross, price improvement, and a partial
    /// fill - the same three behaviors the teacher's `run_basic_demo`
    /// showed, against the new multi-symbol engine.
    Demo,
    /// Launches a pool of trader agents against the engine for a fixed
    /// duration, then prints a summary and optionally exports CSVs.
    Run {
        #[arg(long, default_value_t = 5)]
        traders: usize,
        #[arg(long, value_delimiter = ',', default_values_t = vec!["AAPL".to_string(), "MSFT".to_string(), "TSLA".to_string()])]
        symbols: Vec<String>,
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
        #[arg(long)]
        hft: bool,
        #[arg(long)]
        export_trades: Option<String>,
        #[arg(long)]
        export_snapshot: Option<String>,
    },
    /// Runs the latency/throughput smoke-test suite.
    Bench {
        #[arg(long, default_value_t = 5)]
        throughput_secs: u64,
    },
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Run { traders, symbols, duration_secs, hft, export_trades, export_snapshot } => {
            run_simulation(traders, symbols, duration_secs, hft, export_trades, export_snapshot)
        }
        Commands::Bench { throughput_secs } => {
            latency_test::run_latency_tests();
            latency_test::run_throughput_test(Duration::from_secs(throughput_secs));
        }
    }
}

/// Submits a handful of orders directly (no trader agents) to show a
/// clean cross, price improvement for the taker, and a partial fill
/// resting on the book.
fn run_demo() {
    use matching_core::Order;

    println!("=== Market Simulator Demo ===");
    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();

    println!("\n-- Exact cross --");
    engine.submit(Order::new("alice", "AAPL", Side::Sell, 10, 100.0).unwrap()).unwrap();
    engine.submit(Order::new("bob", "AAPL", Side::Buy, 10, 100.0).unwrap()).unwrap();
    wait_for_drain(&engine);
    print_trades(&engine, "AAPL");

    println!("\n-- Price improvement for the taker (resting ask 101, aggressive bid 105) --");
    engine.submit(Order::new("carol", "AAPL", Side::Sell, 5, 101.0).unwrap()).unwrap();
    engine.submit(Order::new("dave", "AAPL", Side::Buy, 5, 105.0).unwrap()).unwrap();
    wait_for_drain(&engine);
    print_trades(&engine, "AAPL");

    println!("\n-- Partial fill: resting ask 4@100, aggressive bid 10@100 --");
    engine.submit(Order::new("erin", "AAPL", Side::Sell, 4, 100.0).unwrap()).unwrap();
    engine.submit(Order::new("frank", "AAPL", Side::Buy, 10, 100.0).unwrap()).unwrap();
    wait_for_drain(&engine);
    print_trades(&engine, "AAPL");

    if let Some(snapshot) = engine.orderbook_snapshot("AAPL", 5) {
        println!("\nFinal AAPL book: best_bid={:?} best_ask={:?}", snapshot.best_bid, snapshot.best_ask);
    }

    engine.stop();
}

fn print_trades(engine: &Arc<MatchingEngine>, symbol: &str) {
    for trade in engine.recent_trades_for(symbol, 5) {
        println!(
            "  trade {} {}@{} buyer={} seller={}",
            trade.trade_id.0, trade.qty, trade.price, trade.buyer_id, trade.seller_id
        );
    }
}

fn wait_for_drain(engine: &Arc<MatchingEngine>) {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while engine.performance_stats().active_orders > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulation(
    trader_count: usize,
    symbols: Vec<String>,
    duration_secs: u64,
    hft: bool,
    export_trades: Option<String>,
    export_snapshot: Option<String>,
) {
    println!("=== Market Simulator: {trader_count} traders, {} symbols, {duration_secs}s ===", symbols.len());

    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();

    let trader_config = if hft { TraderConfig::hft() } else { TraderConfig::default() };
    let agents: Vec<Arc<TraderAgent>> = (0..trader_count)
        .map(|i| {
            let agent = TraderAgent::new(
                format!("trader-{i}"),
                100_000.0,
                symbols.clone(),
                trader_config.clone(),
                Arc::clone(&engine),
            );
            agent.register_with(&engine);
            agent.start();
            agent
        })
        .collect();

    std::thread::sleep(Duration::from_secs(duration_secs));

    for agent in &agents {
        agent.stop();
    }
    wait_for_drain(&engine);

    let stats = engine.performance_stats();
    println!("\n-- Performance --");
    println!("  total_trades: {}", stats.total_trades);
    println!("  total_volume: {}", stats.total_volume);
    println!("  avg_latency_ms: {:.4}", stats.avg_latency_ms);
    println!("  runtime_seconds: {:.1}", stats.runtime_seconds);

    println!("\n-- Traders --");
    for agent in &agents {
        println!(
            "  {}: cash={:.2} pnl={:.2} orders_sent={} orders_filled={}",
            agent.trader_id,
            agent.cash(),
            agent.total_pnl(),
            agent.orders_sent(),
            agent.orders_filled(),
        );
    }

    if let Some(path) = export_trades {
        let csv = export_all_trades(&engine);
        if let Err(err) = std::fs::write(&path, csv) {
            tracing::error!(%path, "failed to write trades csv: {err}");
        } else {
            println!("\nWrote trade tape to {path}");
        }
    }

    if let Some(path) = export_snapshot {
        let mut combined = String::new();
        for symbol in &symbols {
            if let Some(snapshot) = engine.orderbook_snapshot(symbol, 10) {
                combined.push_str(&book_snapshot_to_csv(&snapshot));
            }
        }
        if let Err(err) = std::fs::write(&path, combined) {
            tracing::error!(%path, "failed to write book snapshot csv: {err}");
        } else {
            println!("Wrote book snapshots to {path}");
        }
    }

    engine.stop();
}
