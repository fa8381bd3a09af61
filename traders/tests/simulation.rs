use std::sync::Arc;
use std::time::Duration;

use engine::{EngineConfig, MatchingEngine};
use traders::{TraderAgent, TraderConfig};

#[test]
fn a_pair_of_agents_trade_without_going_cash_negative() {
    let matching_engine = MatchingEngine::new(EngineConfig::default());
    matching_engine.start();

    let config = TraderConfig { order_frequency_secs: 0.02, ..TraderConfig::default() };
    let alice = TraderAgent::new("alice", 50_000.0, vec!["AAPL".into()], config.clone(), Arc::clone(&matching_engine));
    let bob = TraderAgent::new("bob", 50_000.0, vec!["AAPL".into()], config, Arc::clone(&matching_engine));

    alice.register_with(&matching_engine);
    bob.register_with(&matching_engine);
    alice.start();
    bob.start();

    std::thread::sleep(Duration::from_millis(500));

    alice.stop();
    bob.stop();
    matching_engine.stop();

    assert!(alice.cash() >= 0.0, "alice went cash-negative: {}", alice.cash());
    assert!(bob.cash() >= 0.0, "bob went cash-negative: {}", bob.cash());
    assert!(alice.position("AAPL") >= 0, "alice shorted despite the sell gate: {}", alice.position("AAPL"));
    assert!(bob.position("AAPL") >= 0, "bob shorted despite the sell gate: {}", bob.position("AAPL"));
}

#[test]
fn dropping_a_trader_stops_fill_dispatch_without_panicking() {
    let matching_engine = MatchingEngine::new(EngineConfig::default());
    matching_engine.start();

    {
        let transient = TraderAgent::new("ghost", 10_000.0, vec!["AAPL".into()], TraderConfig::default(), Arc::clone(&matching_engine));
        transient.register_with(&matching_engine);
        // transient is dropped here; only a Weak remains in the engine's registry.
    }

    matching_engine
        .submit(matching_core::Order::new("market-maker", "AAPL", matching_core::Side::Sell, 10, 100.0).unwrap())
        .unwrap();
    matching_engine
        .submit(matching_core::Order::new("ghost", "AAPL", matching_core::Side::Buy, 10, 100.0).unwrap())
        .unwrap();

    std::thread::sleep(Duration::from_millis(200));
    matching_engine.stop();
}
