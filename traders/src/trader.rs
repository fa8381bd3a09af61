use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine::{FillEvent, FillListener, MatchingEngine};
use matching_core::{Order, Side};
use rand::Rng;

use crate::config::TraderConfig;
use crate::distributions::{sample_delay_secs, sample_price_variation, sample_quantity};

const RANDOM_WALK_SIGMA: f64 = 0.01;
const PRICE_FLOOR: f64 = 1.0;
const STARTING_PRICE_GUESS: f64 = 100.0;

struct TraderState {
    cash: f64,
    positions: HashMap<String, i64>,
    avg_cost: HashMap<String, f64>,
    orders_sent: u64,
    orders_filled: u64,
    total_volume: i64,
}

/// A simulated trading bot: generates a continuous stream of limit
/// orders against the symbols it's assigned, and tracks its own
/// portfolio from the fills the engine reports back.
///
/// Holds a strong `Arc<MatchingEngine>` to submit orders and query
/// market state; the engine in turn holds only a `Weak` reference back
/// to this agent (registered via `register_with`), so the two never
/// form a reference cycle and a `TraderAgent` that's dropped stops
/// receiving fill callbacks automatically.
pub struct TraderAgent {
    pub trader_id: String,
    pub initial_cash: f64,
    pub symbols: Vec<String>,
    pub config: TraderConfig,
    engine: Arc<MatchingEngine>,
    state: Mutex<TraderState>,
    market_price_cache: Mutex<HashMap<String, f64>>,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TraderAgent {
    pub fn new(
        trader_id: impl Into<String>,
        initial_cash: f64,
        symbols: Vec<String>,
        config: TraderConfig,
        engine: Arc<MatchingEngine>,
    ) -> Arc<Self> {
        let market_price_cache = symbols.iter().map(|s| (s.clone(), STARTING_PRICE_GUESS)).collect();
        let positions = symbols.iter().map(|s| (s.clone(), 0)).collect();
        let avg_cost = symbols.iter().map(|s| (s.clone(), 0.0)).collect();

        Arc::new(Self {
            trader_id: trader_id.into(),
            initial_cash,
            symbols,
            config,
            engine,
            state: Mutex::new(TraderState {
                cash: initial_cash,
                positions,
                avg_cost,
                orders_sent: 0,
                orders_filled: 0,
                total_volume: 0,
            }),
            market_price_cache: Mutex::new(market_price_cache),
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
        })
    }

    /// Registers this agent with the engine as a weak fill listener.
    /// Call once, before `start`.
    pub fn register_with(self: &Arc<Self>, engine: &MatchingEngine) {
        engine.register_trader(self.trader_id.clone(), Arc::downgrade(self) as std::sync::Weak<dyn FillListener>);
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let agent = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(format!("trader-{}", self.trader_id))
            .spawn(move || agent.generation_loop())
            .expect("failed to spawn trader generation thread");
        *self.worker.lock().unwrap() = Some(handle);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let (done_tx, done_rx) = std::sync::mpsc::channel();
            thread::spawn(move || {
                let _ = handle.join();
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(Duration::from_secs(1)).is_err() {
                tracing::warn!(trader_id = %self.trader_id, "generation loop did not stop within the shutdown timeout");
            }
        }
    }

    pub fn cash(&self) -> f64 {
        self.state.lock().unwrap().cash
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.state.lock().unwrap().positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn orders_sent(&self) -> u64 {
        self.state.lock().unwrap().orders_sent
    }

    pub fn orders_filled(&self) -> u64 {
        self.state.lock().unwrap().orders_filled
    }

    pub fn total_volume(&self) -> i64 {
        self.state.lock().unwrap().total_volume
    }

    pub fn portfolio_value(&self) -> f64 {
        let state = self.state.lock().unwrap();
        let mut value = state.cash;
        for (symbol, &position) in &state.positions {
            if position > 0 {
                value += position as f64 * self.estimate_market_price(symbol);
            }
        }
        value
    }

    pub fn total_pnl(&self) -> f64 {
        self.portfolio_value() - self.initial_cash
    }

    fn generation_loop(&self) {
        let mut rng = rand::thread_rng();
        while self.running.load(Ordering::SeqCst) {
            let delay = sample_delay_secs(self.config.order_frequency_secs, &mut rng);
            thread::sleep(Duration::from_secs_f64(delay.max(0.0)));
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.generate_order(&mut rng);
        }
    }

    fn generate_order(&self, rng: &mut impl Rng) {
        if self.symbols.is_empty() {
            return;
        }
        let symbol = &self.symbols[rng.gen_range(0..self.symbols.len())];
        let market_price = self.estimate_market_price(symbol);
        let side = self.decide_side(symbol, rng);

        let mut qty = sample_quantity(self.config.min_order_size, self.config.max_order_size, rng);
        let variation = sample_price_variation(self.config.price_volatility, rng);
        let price = match side {
            Side::Buy => round2(market_price * (1.0 - variation.abs())),
            Side::Sell => round2(market_price * (1.0 + variation.abs())),
        };

        match side {
            Side::Buy => {
                let cash = self.state.lock().unwrap().cash;
                if qty as f64 * price > cash {
                    let affordable = (cash / price).floor() as i64;
                    if affordable < self.config.min_order_size {
                        return;
                    }
                    qty = affordable;
                }
            }
            Side::Sell => {
                let position = self.position(symbol);
                if qty > position {
                    // Asymmetric by design: only down-adjust when there's at
                    // least a minimum clip's worth to sell; otherwise skip
                    // without touching qty.
                    if position < self.config.min_order_size {
                        return;
                    }
                    qty = position;
                }
            }
        }

        if qty <= 0 {
            return;
        }

        let order = match Order::new(self.trader_id.clone(), symbol.clone(), side, qty, price) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(trader_id = %self.trader_id, %symbol, "skipped invalid generated order: {err}");
                return;
            }
        };

        match self.engine.submit(order) {
            Ok(_) => {
                self.state.lock().unwrap().orders_sent += 1;
            }
            Err(err) => {
                tracing::warn!(trader_id = %self.trader_id, "order submission failed: {err}");
            }
        }
    }

    fn decide_side(&self, symbol: &str, rng: &mut impl Rng) -> Side {
        let position = self.position(symbol);
        if position > 500 {
            if rng.gen::<f64>() < 0.7 {
                Side::Sell
            } else {
                Side::Buy
            }
        } else if position == 0 {
            if rng.gen::<f64>() < 0.7 {
                Side::Buy
            } else {
                Side::Sell
            }
        } else if rng.gen::<bool>() {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn estimate_market_price(&self, symbol: &str) -> f64 {
        let recent = self.engine.recent_trades_for(symbol, 5);
        if !recent.is_empty() {
            let total_value: f64 = recent.iter().map(|t| t.price * t.qty as f64).sum();
            let total_volume: i64 = recent.iter().map(|t| t.qty).sum();
            if total_volume > 0 {
                let vwap = total_value / total_volume as f64;
                self.market_price_cache.lock().unwrap().insert(symbol.to_string(), vwap);
                return vwap;
            }
        }

        if let Some(snapshot) = self.engine.orderbook_snapshot(symbol, 1) {
            if let (Some(bid), Some(ask)) = (snapshot.best_bid, snapshot.best_ask) {
                let mid = (bid + ask) / 2.0;
                self.market_price_cache.lock().unwrap().insert(symbol.to_string(), mid);
                return mid;
            }
        }

        let mut cache = self.market_price_cache.lock().unwrap();
        let current = *cache.get(symbol).unwrap_or(&STARTING_PRICE_GUESS);
        let change = sample_price_variation(RANDOM_WALK_SIGMA, &mut rand::thread_rng());
        let next = (current * (1.0 + change)).max(PRICE_FLOOR);
        cache.insert(symbol.to_string(), next);
        next
    }
}

impl FillListener for TraderAgent {
    fn on_fill(&self, event: FillEvent) {
        let mut state = self.state.lock().unwrap();
        let value = event.qty as f64 * event.price;

        match event.side {
            Side::Buy => {
                state.cash -= value;
                let old_position = *state.positions.get(&event.symbol).unwrap_or(&0);
                let old_basis = *state.avg_cost.get(&event.symbol).unwrap_or(&0.0) * old_position as f64;
                let new_position = old_position + event.qty;
                state.positions.insert(event.symbol.clone(), new_position);
                if new_position > 0 {
                    state.avg_cost.insert(event.symbol.clone(), (old_basis + value) / new_position as f64);
                }
            }
            Side::Sell => {
                state.cash += value;
                let new_position = state.positions.get(&event.symbol).copied().unwrap_or(0) - event.qty;
                state.positions.insert(event.symbol.clone(), new_position);
                if new_position == 0 {
                    state.avg_cost.insert(event.symbol.clone(), 0.0);
                }
            }
        }

        state.orders_filled += 1;
        state.total_volume += event.qty;
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
