use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use matching_core::{BookSnapshot, Order, OrderBook, OrderId, Side, Trade};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::matching;
use crate::stats::{PerformanceStats, TapeAndStats};
use crate::trader_handle::{FillEvent, FillListener};
use crate::types::SymbolSummary;

struct ActiveOrderLocation {
    symbol: String,
    side: Side,
}

enum EngineCommand {
    Submit(Order),
}

/// Owns every symbol's order book, the ingest queue, the single matching
/// worker thread, and the registries (active orders, traders, trade
/// tape/stats) the matching step touches.
///
/// Global state is partitioned into four lock domains, acquired in this
/// fixed order whenever more than one is needed at once: trader registry,
/// active-order index, tape+counters, per-symbol book. Submitting an
/// order never blocks beyond the cost of the channel send; cancelling an
/// order is synchronous and race-safe because the active-order index is
/// removed from atomically before the book is touched.
pub struct MatchingEngine {
    config: EngineConfig,
    books: DashMap<String, RwLock<OrderBook>>,
    active_orders: Mutex<HashMap<OrderId, ActiveOrderLocation>>,
    traders: Mutex<HashMap<String, Weak<dyn FillListener>>>,
    tape_stats: Mutex<TapeAndStats>,
    sender: mpsc::Sender<EngineCommand>,
    receiver: Mutex<Option<mpsc::Receiver<EngineCommand>>>,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    start_time: Instant,
}

impl MatchingEngine {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel();
        Arc::new(Self {
            tape_stats: Mutex::new(TapeAndStats::new(config.global_trade_tape_capacity)),
            config,
            books: DashMap::new(),
            active_orders: Mutex::new(HashMap::new()),
            traders: Mutex::new(HashMap::new()),
            sender,
            receiver: Mutex::new(Some(receiver)),
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
            start_time: Instant::now(),
        })
    }

    /// Spawns the matching worker thread. Orders submitted before `start`
    /// are queued but not matched until the worker begins draining the
    /// channel; submitting never implicitly starts the engine.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .expect("engine can only be started once per construction");
        let engine = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("matching-worker".into())
            .spawn(move || engine.run_worker(receiver))
            .expect("failed to spawn matching worker thread");
        *self.worker.lock().unwrap() = Some(handle);
    }

    /// Signals the worker to stop and joins it, waiting up to two
    /// seconds before giving up.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let (done_tx, done_rx) = mpsc::channel();
            thread::spawn(move || {
                let _ = handle.join();
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(Duration::from_secs(2)).is_err() {
                tracing::warn!("matching worker did not stop within the shutdown timeout");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers a trader's fill listener. The engine only holds a weak
    /// reference, so a dropped trader is skipped silently rather than
    /// kept alive by the registry.
    pub fn register_trader(&self, trader_id: impl Into<String>, listener: Weak<dyn FillListener>) {
        self.traders.lock().unwrap().insert(trader_id.into(), listener);
    }

    /// Enqueues `order` for matching. Never blocks beyond the cost of the
    /// channel send; returns the assigned order id immediately.
    pub fn submit(&self, order: Order) -> Result<OrderId, EngineError> {
        let id = order.id;
        self.sender.send(EngineCommand::Submit(order)).map_err(|_| EngineError::QueueClosed)?;
        Ok(id)
    }

    /// Cancels a resting order synchronously. Idempotent: a second
    /// cancel of the same id (or of an already-filled order) returns
    /// `Ok(false)` without touching the book.
    pub fn cancel(&self, id: OrderId) -> Result<bool, EngineError> {
        let location = self.active_orders.lock().unwrap().remove(&id);
        let Some(location) = location else {
            return Ok(false);
        };
        let book_lock = self
            .books
            .get(&location.symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(location.symbol.clone()))?;
        let mut book = book_lock.write().unwrap();
        match book.remove_order(id, location.side) {
            Some(mut order) => {
                order.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn orderbook_snapshot(&self, symbol: &str, depth: usize) -> Option<BookSnapshot> {
        let book_lock = self.books.get(symbol)?;
        let book = book_lock.read().unwrap();
        Some(book.snapshot(depth))
    }

    pub fn recent_trades(&self, n: usize) -> Vec<Trade> {
        self.tape_stats.lock().unwrap().recent(n)
    }

    pub fn recent_trades_for(&self, symbol: &str, n: usize) -> Vec<Trade> {
        self.tape_stats.lock().unwrap().recent_for_symbol(symbol, n)
    }

    pub fn all_trades(&self) -> Vec<Trade> {
        self.tape_stats.lock().unwrap().all()
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        let active_orders = self.active_orders.lock().unwrap().len();
        let symbols_active = self.books.len();
        let runtime_seconds = self.start_time.elapsed().as_secs_f64();
        self.tape_stats
            .lock()
            .unwrap()
            .snapshot(active_orders, symbols_active, runtime_seconds)
    }

    /// Per-symbol summary with distinct best bid/ask and a VWAP over the
    /// five most recent trades in that symbol.
    pub fn market_summary(&self) -> HashMap<String, SymbolSummary> {
        let mut summary = HashMap::with_capacity(self.books.len());
        for entry in self.books.iter() {
            let symbol = entry.key().clone();
            let book = entry.value().read().unwrap();
            let recent = book.recent_trades(5);
            let (vwap, volume, trade_count) = if recent.is_empty() {
                (None, 0, 0)
            } else {
                let total_value: f64 = recent.iter().map(|t| t.price * t.qty as f64).sum();
                let total_volume: i64 = recent.iter().map(|t| t.qty).sum();
                let vwap = if total_volume > 0 {
                    Some(total_value / total_volume as f64)
                } else {
                    None
                };
                (vwap, total_volume, recent.len())
            };
            summary.insert(
                symbol,
                SymbolSummary {
                    best_bid: book.best_bid(),
                    best_ask: book.best_ask(),
                    spread: book.spread(),
                    mid_price: book.mid_price(),
                    vwap,
                    volume,
                    trade_count,
                },
            );
        }
        summary
    }

    fn run_worker(self: Arc<Self>, receiver: mpsc::Receiver<EngineCommand>) {
        tracing::info!("matching worker started");
        while self.running.load(Ordering::SeqCst) {
            let mut batch = Vec::with_capacity(self.config.batch_size);
            let deadline = Instant::now() + Duration::from_millis(1);
            while batch.len() < self.config.batch_size && Instant::now() < deadline {
                match receiver.try_recv() {
                    Ok(cmd) => batch.push(cmd),
                    Err(mpsc::TryRecvError::Empty) => break,
                    Err(mpsc::TryRecvError::Disconnected) => {
                        self.running.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }

            if batch.is_empty() {
                thread::sleep(Duration::from_micros(100));
                continue;
            }

            for cmd in batch {
                match cmd {
                    EngineCommand::Submit(order) => self.process_order(order),
                }
            }
        }
        tracing::info!("matching worker stopped");
    }

    fn process_order(&self, order: Order) {
        let process_start = Instant::now();
        let id = order.id;
        let symbol = order.symbol.clone();
        let side = order.side;

        self.active_orders
            .lock()
            .unwrap()
            .insert(id, ActiveOrderLocation { symbol: symbol.clone(), side });

        let book_entry = self
            .books
            .entry(symbol.clone())
            .or_insert_with(|| RwLock::new(OrderBook::with_tape_capacity(symbol.clone(), self.config.book_trade_tape_capacity)));

        let (trades, fills, removed_maker_ids, taker_resting) = {
            let mut book = book_entry.write().unwrap();
            let outcome = matching::match_order(order, &mut book);
            let taker_resting = outcome.taker.remaining_qty > 0 && outcome.taker.is_active();
            if taker_resting {
                book.add_order(outcome.taker)
                    .expect("order symbol already matches this book");
            }
            (outcome.trades, outcome.fills, outcome.removed_maker_ids, taker_resting)
        };
        drop(book_entry);

        if !removed_maker_ids.is_empty() || !taker_resting {
            let mut active = self.active_orders.lock().unwrap();
            for maker_id in &removed_maker_ids {
                active.remove(maker_id);
            }
            if !taker_resting {
                active.remove(&id);
            }
        }

        for trade in &trades {
            tracing::debug!(
                trade_id = trade.trade_id.0,
                symbol = %trade.symbol,
                qty = trade.qty,
                price = trade.price,
                "trade executed"
            );
        }

        {
            let mut stats = self.tape_stats.lock().unwrap();
            stats.record_trades(&trades);
            stats.record_latency_ms(process_start.elapsed().as_secs_f64() * 1000.0);
        }

        for fill in fills {
            self.dispatch_fill(fill);
        }
    }

    fn dispatch_fill(&self, event: FillEvent) {
        let listener = self.traders.lock().unwrap().get(&event.trader_id).cloned();
        let Some(listener) = listener else { return };
        let Some(listener) = listener.upgrade() else { return };
        let trader_id = event.trader_id.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener.on_fill(event)));
        if outcome.is_err() {
            tracing::error!(trader_id = %trader_id, "trader fill callback panicked; isolated from matching thread");
        }
    }
}
