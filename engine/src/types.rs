//! Ancillary types returned by the engine's query surface.

use serde::{Deserialize, Serialize};

/// Per-symbol market summary: distinct best bid and best ask, unlike a
/// known-buggy variant of this summary that collapsed both onto the
/// mid-price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub spread: Option<f64>,
    pub mid_price: Option<f64>,
    pub vwap: Option<f64>,
    pub volume: i64,
    pub trade_count: usize,
}
