use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::book_side::{BookSide, PriceLevelView};
use crate::error::CoreError;
use crate::order::{Order, OrderId, Side};

/// Opaque, process-unique trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

static NEXT_TRADE_ID: AtomicU64 = AtomicU64::new(1);

impl TradeId {
    pub fn next() -> Self {
        TradeId(NEXT_TRADE_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// An immutable record of one execution between two orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub ts: DateTime<Utc>,
    pub symbol: String,
    pub qty: i64,
    pub price: f64,
    pub buyer_id: String,
    pub seller_id: String,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub aggressor_side: Side,
}

/// A point-in-time view of the top of book, for export/inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub bids: Vec<PriceLevelView>,
    pub asks: Vec<PriceLevelView>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub spread: Option<f64>,
    pub mid_price: Option<f64>,
}

pub const DEFAULT_TRADE_TAPE_CAPACITY: usize = 1000;

/// One symbol's complete order book: both sides plus a bounded tape of
/// the most recent trades in this symbol.
///
/// The book itself performs no matching — that is the matching engine's
/// job (C4). This type only owns the priority structures and exposes the
/// mutations and queries the engine and external readers need.
pub struct OrderBook {
    pub symbol: String,
    pub bids: BookSide,
    pub asks: BookSide,
    trades: VecDeque<Trade>,
    tape_capacity: usize,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_tape_capacity(symbol, DEFAULT_TRADE_TAPE_CAPACITY)
    }

    pub fn with_tape_capacity(symbol: impl Into<String>, tape_capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            trades: VecDeque::with_capacity(tape_capacity.min(4096)),
            tape_capacity,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Adds `order` to its side. Fails with `SymbolMismatch` if the
    /// order's symbol differs from this book's.
    pub fn add_order(&mut self, order: Order) -> Result<(), CoreError> {
        if order.symbol != self.symbol {
            return Err(CoreError::SymbolMismatch {
                order_symbol: order.symbol,
                book_symbol: self.symbol.clone(),
            });
        }
        let side = order.side;
        self.side_mut(side).add(order);
        Ok(())
    }

    pub fn remove_order(&mut self, id: OrderId, side: Side) -> Option<Order> {
        self.side_mut(side).remove(id)
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.best_price()
    }

    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }

    /// True only transiently, during a matching step. After the engine's
    /// match routine returns, the book must never be crossed.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        if self.trades.len() >= self.tape_capacity {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
    }

    pub fn recent_trades(&self, n: usize) -> Vec<Trade> {
        let len = self.trades.len();
        let start = len.saturating_sub(n);
        self.trades.iter().skip(start).cloned().collect()
    }

    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol.clone(),
            ts: Utc::now(),
            bids: self.bids.top_levels(depth),
            asks: self.asks.top_levels(depth),
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread(),
            mid_price: self.mid_price(),
        }
    }

    pub fn best_order(&self, side: Side) -> Option<&Order> {
        self.side(side).best_order()
    }

    pub fn best_order_mut(&mut self, side: Side) -> Option<&mut Order> {
        self.side_mut(side).best_order_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;

    fn order(side: Side, price: f64, qty: i64, symbol: &str) -> Order {
        Order {
            id: OrderId::next(),
            trader_id: "T".into(),
            symbol: symbol.into(),
            side,
            remaining_qty: qty,
            original_qty: qty,
            price,
            status: OrderStatus::Pending,
            created_ts: Utc::now(),
            submission_ts: None,
            fills: Vec::new(),
        }
    }

    #[test]
    fn add_order_rejects_symbol_mismatch() {
        let mut book = OrderBook::new("AAPL");
        let err = book.add_order(order(Side::Buy, 100.0, 10, "MSFT")).unwrap_err();
        assert!(matches!(err, CoreError::SymbolMismatch { .. }));
    }

    #[test]
    fn not_crossed_when_one_side_empty_or_spread_positive() {
        let mut book = OrderBook::new("AAPL");
        assert!(!book.is_crossed());
        book.add_order(order(Side::Buy, 99.0, 10, "AAPL")).unwrap();
        assert!(!book.is_crossed());
        book.add_order(order(Side::Sell, 101.0, 10, "AAPL")).unwrap();
        assert!(!book.is_crossed());
        assert_eq!(book.spread(), Some(2.0));
        assert_eq!(book.mid_price(), Some(100.0));
    }

    #[test]
    fn recent_trades_returns_most_recent_n_in_order() {
        let mut book = OrderBook::new("AAPL");
        for i in 0..5 {
            book.record_trade(Trade {
                trade_id: TradeId::next(),
                ts: Utc::now(),
                symbol: "AAPL".into(),
                qty: 1,
                price: 100.0 + i as f64,
                buyer_id: "B".into(),
                seller_id: "S".into(),
                buy_order_id: OrderId::next(),
                sell_order_id: OrderId::next(),
                aggressor_side: Side::Buy,
            });
        }
        let last_two = book.recent_trades(2);
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].price, 103.0);
        assert_eq!(last_two[1].price, 104.0);
    }

    #[test]
    fn trade_tape_is_bounded() {
        let mut book = OrderBook::with_tape_capacity("AAPL", 3);
        for _ in 0..10 {
            book.record_trade(Trade {
                trade_id: TradeId::next(),
                ts: Utc::now(),
                symbol: "AAPL".into(),
                qty: 1,
                price: 100.0,
                buyer_id: "B".into(),
                seller_id: "S".into(),
                buy_order_id: OrderId::next(),
                sell_order_id: OrderId::next(),
                aggressor_side: Side::Buy,
            });
        }
        assert_eq!(book.recent_trades(100).len(), 3);
    }
}
