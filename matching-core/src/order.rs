use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which side of the book an order rests on or crosses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Lifecycle state of an order. Transitions are monotone in filled
/// quantity: `Pending -> PartiallyFilled -> Filled`, with `Cancelled`
/// reachable (and terminal) from either of the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
}

/// Opaque, process-unique order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1);

impl OrderId {
    /// Mints a fresh id. Ids are unique for the lifetime of the process,
    /// not globally stable across restarts (no persistence, per spec).
    pub fn next() -> Self {
        OrderId(NEXT_ORDER_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// A single execution against an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub qty: i64,
    pub price: f64,
    pub ts: DateTime<Utc>,
}

/// A resting or in-flight limit order.
///
/// Identity (`id`, `trader_id`, `symbol`, `side`, `original_qty`, `price`,
/// `created_ts`) is fixed at construction. `remaining_qty`, `status`,
/// `fills`, and `submission_ts` are mutated only by the matching engine
/// while the order is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trader_id: String,
    pub symbol: String,
    pub side: Side,
    pub remaining_qty: i64,
    pub original_qty: i64,
    pub price: f64,
    pub status: OrderStatus,
    pub created_ts: DateTime<Utc>,
    pub submission_ts: Option<DateTime<Utc>>,
    pub fills: Vec<Fill>,
}

impl Order {
    /// Builds a new `Pending` order. Fails if `qty <= 0`, `price` is not
    /// finite and positive, or `symbol` is empty.
    pub fn new(
        trader_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        qty: i64,
        price: f64,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if qty <= 0 {
            return Err(CoreError::InvalidArgument(format!(
                "quantity must be positive, got {qty}"
            )));
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(CoreError::InvalidArgument(format!(
                "price must be a positive finite number, got {price}"
            )));
        }
        if symbol.trim().is_empty() {
            return Err(CoreError::InvalidArgument("symbol must not be empty".into()));
        }

        Ok(Order {
            id: OrderId::next(),
            trader_id: trader_id.into(),
            symbol,
            side,
            remaining_qty: qty,
            original_qty: qty,
            price,
            status: OrderStatus::Pending,
            created_ts: Utc::now(),
            submission_ts: None,
            fills: Vec::new(),
        })
    }

    /// Applies a fill of `qty` shares at `price`, advancing status.
    pub fn apply_fill(&mut self, qty: i64, price: f64, ts: DateTime<Utc>) -> Result<(), CoreError> {
        if qty > self.remaining_qty {
            return Err(CoreError::OverFill {
                qty,
                remaining: self.remaining_qty,
            });
        }
        self.fills.push(Fill { qty, price, ts });
        self.remaining_qty -= qty;
        self.status = if self.remaining_qty == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        Ok(())
    }

    /// Transitions to `Cancelled` from `Pending`/`PartiallyFilled`; a
    /// no-op from `Filled`/`Cancelled`.
    pub fn cancel(&mut self) {
        if matches!(self.status, OrderStatus::Pending | OrderStatus::PartiallyFilled) {
            self.status = OrderStatus::Cancelled;
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }

    pub fn filled_qty(&self) -> i64 {
        self.original_qty - self.remaining_qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_nonpositive_qty_and_price() {
        assert!(Order::new("T1", "AAPL", Side::Buy, 0, 10.0).is_err());
        assert!(Order::new("T1", "AAPL", Side::Buy, 10, 0.0).is_err());
        assert!(Order::new("T1", "AAPL", Side::Buy, 10, -1.0).is_err());
        assert!(Order::new("T1", "", Side::Buy, 10, 1.0).is_err());
        assert!(Order::new("T1", "AAPL", Side::Buy, 10, 1.0).is_ok());
    }

    #[test]
    fn apply_fill_updates_status_monotonically() {
        let mut o = Order::new("T1", "AAPL", Side::Buy, 10, 100.0).unwrap();
        assert_eq!(o.status, OrderStatus::Pending);

        o.apply_fill(4, 100.0, Utc::now()).unwrap();
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        assert_eq!(o.remaining_qty, 6);
        assert_eq!(o.filled_qty(), 4);

        o.apply_fill(6, 100.0, Utc::now()).unwrap();
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.remaining_qty, 0);
        assert_eq!(o.original_qty, o.fills.iter().map(|f| f.qty).sum::<i64>() + o.remaining_qty);
    }

    #[test]
    fn apply_fill_rejects_overfill() {
        let mut o = Order::new("T1", "AAPL", Side::Buy, 10, 100.0).unwrap();
        let err = o.apply_fill(11, 100.0, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::OverFill { qty: 11, remaining: 10 }));
    }

    #[test]
    fn cancel_is_terminal_and_idempotent_noop_from_filled() {
        let mut o = Order::new("T1", "AAPL", Side::Buy, 10, 100.0).unwrap();
        o.apply_fill(10, 100.0, Utc::now()).unwrap();
        assert_eq!(o.status, OrderStatus::Filled);
        o.cancel();
        assert_eq!(o.status, OrderStatus::Filled, "cancel after fill is a no-op");

        let mut o2 = Order::new("T1", "AAPL", Side::Buy, 10, 100.0).unwrap();
        o2.cancel();
        assert_eq!(o2.status, OrderStatus::Cancelled);
        assert!(!o2.is_active());
    }
}
