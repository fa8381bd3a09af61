use std::collections::VecDeque;
use std::time::Instant;

use matching_core::Trade;
use serde::{Deserialize, Serialize};

/// Snapshot of engine-wide performance counters, returned by
/// `MatchingEngine::performance_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_trades: u64,
    pub total_volume: i64,
    pub trades_per_second: f64,
    pub orders_per_second: f64,
    pub avg_latency_ms: f64,
    pub active_orders: usize,
    pub runtime_seconds: f64,
    pub symbols_active: usize,
}

const LATENCY_WINDOW: usize = 1000;

/// The engine's global trade tape plus the running counters behind
/// `performance_stats`. One lock covers both, matching the {tape,
/// counters} partition of the engine's global state.
pub(crate) struct TapeAndStats {
    pub(crate) tape: VecDeque<Trade>,
    tape_capacity: usize,
    total_trades: u64,
    total_volume: i64,
    latencies_ms: VecDeque<f64>,
    orders_processed_since_update: u64,
    last_stats_update: Instant,
    orders_per_second: f64,
}

impl TapeAndStats {
    pub(crate) fn new(tape_capacity: usize) -> Self {
        Self {
            tape: VecDeque::with_capacity(tape_capacity.min(4096)),
            tape_capacity,
            total_trades: 0,
            total_volume: 0,
            latencies_ms: VecDeque::with_capacity(LATENCY_WINDOW),
            orders_processed_since_update: 0,
            last_stats_update: Instant::now(),
            orders_per_second: 0.0,
        }
    }

    pub(crate) fn record_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            if self.tape.len() >= self.tape_capacity {
                self.tape.pop_front();
            }
            self.tape.push_back(trade.clone());
            self.total_trades += 1;
            self.total_volume += trade.qty;
        }
    }

    pub(crate) fn record_latency_ms(&mut self, latency_ms: f64) {
        if self.latencies_ms.len() >= LATENCY_WINDOW {
            self.latencies_ms.pop_front();
        }
        self.latencies_ms.push_back(latency_ms);

        self.orders_processed_since_update += 1;
        if self.last_stats_update.elapsed().as_secs_f64() >= 1.0 {
            self.orders_per_second = self.orders_processed_since_update as f64;
            self.orders_processed_since_update = 0;
            self.last_stats_update = Instant::now();
        }
    }

    pub(crate) fn recent(&self, n: usize) -> Vec<Trade> {
        let start = self.tape.len().saturating_sub(n);
        self.tape.iter().skip(start).cloned().collect()
    }

    pub(crate) fn recent_for_symbol(&self, symbol: &str, n: usize) -> Vec<Trade> {
        let matching: Vec<Trade> = self.tape.iter().filter(|t| t.symbol == symbol).cloned().collect();
        let start = matching.len().saturating_sub(n);
        matching[start..].to_vec()
    }

    pub(crate) fn all(&self) -> Vec<Trade> {
        self.tape.iter().cloned().collect()
    }

    pub(crate) fn snapshot(&self, active_orders: usize, symbols_active: usize, runtime_seconds: f64) -> PerformanceStats {
        let trades_per_second = self.total_trades as f64 / runtime_seconds.max(1.0);
        let avg_latency_ms = if self.latencies_ms.is_empty() {
            0.0
        } else {
            self.latencies_ms.iter().sum::<f64>() / self.latencies_ms.len() as f64
        };
        PerformanceStats {
            total_trades: self.total_trades,
            total_volume: self.total_volume,
            trades_per_second,
            orders_per_second: self.orders_per_second,
            avg_latency_ms,
            active_orders,
            runtime_seconds,
            symbols_active,
        }
    }
}
