//! Lightweight performance smoke tests for the matching engine.
//!
//! These are not a substitute for the `criterion` benchmarks in
//! `matching-core/benches/` (which isolate the book's data structures);
//! they exercise the full path a submitted order actually takes -
//! ingest queue, worker thread, matching, fill dispatch - the same way
//! a trader's order does in a real run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine::{EngineConfig, MatchingEngine};
use matching_core::{Order, Side};

/// Measures best-bid/best-ask lookup latency against a populated book,
/// bypassing the engine (pure `matching-core` structure access).
pub fn run_market_data_latency_test() {
    println!(" Market Data Latency Test");

    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();
    for i in 0..100 {
        let ask = Order::new("seed", "AAPL", Side::Sell, 100, 100.0 + i as f64 * 0.01).unwrap();
        let bid = Order::new("seed", "AAPL", Side::Buy, 100, 99.99 - i as f64 * 0.01).unwrap();
        engine.submit(ask).unwrap();
        engine.submit(bid).unwrap();
    }
    std::thread::sleep(Duration::from_millis(50));

    let iterations = 200_000;
    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(engine.orderbook_snapshot("AAPL", 1));
    }
    let elapsed = start.elapsed();
    engine.stop();

    println!(
        "  Snapshot(depth=1) lookup: {:.2} ns/call\n",
        elapsed.as_nanos() as f64 / iterations as f64
    );
}

/// Measures submit-to-processed latency for non-crossing orders by
/// polling `performance_stats` until the active-order count catches up.
pub fn run_submission_latency_test() {
    println!(" Order Submission Latency Test");

    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();

    let iterations = 2_000;
    let start = Instant::now();
    for i in 0..iterations {
        let price = 100.0 - (i as f64 * 0.001);
        let order = Order::new("t1", "AAPL", Side::Buy, 10, price).unwrap();
        engine.submit(order).unwrap();
    }
    drain(&engine, iterations as u64);
    let elapsed = start.elapsed();
    engine.stop();

    let avg_ns = elapsed.as_nanos() as f64 / iterations as f64;
    println!("  Average submit-to-drain: {:.2} ns", avg_ns);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_ns);
}

/// Measures crossing-order latency: a resting book of asks, then a
/// single aggressive buy that walks several levels per iteration.
pub fn run_matching_latency_test() {
    println!(" Order Matching Latency Test");

    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();

    let iterations = 500u64;
    let start = Instant::now();
    for i in 0..iterations {
        for j in 0..10 {
            let ask = Order::new("maker", "AAPL", Side::Sell, 100, 100.0 + j as f64).unwrap();
            engine.submit(ask).unwrap();
        }
        let taker = Order::new("taker", "AAPL", Side::Buy, 500, 105.0).unwrap();
        engine.submit(taker).unwrap();
        let _ = i;
    }
    drain(&engine, iterations * 11);
    let elapsed = start.elapsed();
    let stats = engine.performance_stats();
    engine.stop();

    println!("  Total order-to-trade: {:.2} us/iteration", elapsed.as_micros() as f64 / iterations as f64);
    println!("  Trades executed: {}\n", stats.total_trades);
}

/// Sustained mixed-workload throughput test: 25% each of non-crossing
/// bid/ask and crossing bid/ask, for `duration`.
pub fn run_throughput_test(duration: Duration) {
    println!(" Sustained Throughput Test ({:.0} seconds)", duration.as_secs_f64());

    let engine = MatchingEngine::new(EngineConfig::default());
    engine.start();

    let start_time = Instant::now();
    let mut submitted = 0u64;
    while start_time.elapsed() < duration {
        let order = match submitted % 4 {
            0 => Order::new("t", "AAPL", Side::Buy, 100, 99.0 - (submitted % 100) as f64 * 0.01),
            1 => Order::new("t", "AAPL", Side::Sell, 100, 101.0 + (submitted % 100) as f64 * 0.01),
            2 => Order::new("t", "AAPL", Side::Buy, 50, 101.01),
            3 => Order::new("t", "AAPL", Side::Sell, 50, 98.99),
            _ => unreachable!(),
        }
        .unwrap();
        if engine.submit(order).is_err() {
            break;
        }
        submitted += 1;
    }

    // Give the worker a moment to drain the tail of the queue before reading stats.
    std::thread::sleep(Duration::from_millis(50));
    let elapsed = start_time.elapsed();
    let stats = engine.performance_stats();
    engine.stop();

    println!("  Duration: {:.1} seconds", elapsed.as_secs_f64());
    println!("  Orders submitted: {}", submitted);
    println!("  Trades executed: {}", stats.total_trades);
    println!("  Order throughput: {:.0} orders/second", submitted as f64 / elapsed.as_secs_f64());
    println!("  Trade throughput: {:.0} trades/second", stats.total_trades as f64 / elapsed.as_secs_f64());
}

/// Blocks until the engine's active-order count implies everything
/// submitted so far has been drained past the matching step, or a
/// generous timeout elapses.
fn drain(engine: &Arc<MatchingEngine>, _submitted: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        std::thread::sleep(Duration::from_micros(200));
        let stats = engine.performance_stats();
        if stats.active_orders == 0 || Instant::now() > deadline {
            break;
        }
    }
}

/// Runs the complete latency test suite.
pub fn run_latency_tests() {
    println!(" HFT Ledger - Real-time Latency Tests\n");
    run_market_data_latency_test();
    run_submission_latency_test();
    run_matching_latency_test();
}
