use chrono::{DateTime, Utc};
use matching_core::{OrderId, Side};

/// One execution reported back to the trader that owns the filled order.
#[derive(Debug, Clone, PartialEq)]
pub struct FillEvent {
    pub order_id: OrderId,
    pub trader_id: String,
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub price: f64,
    pub ts: DateTime<Utc>,
}

/// Implemented by anything that wants to be notified when one of its
/// orders fills. The engine holds only a `Weak` reference to each
/// registered listener, so a trader that has been dropped is silently
/// skipped rather than kept alive artificially — this is how the
/// engine-trader cyclic reference (engine holds traders, traders hold
/// a handle back to the engine to submit orders) is broken.
///
/// The engine calls `on_fill` inline on the matching thread. Slow or
/// panicking implementations are isolated: a panic is caught and logged,
/// never propagated, and never rolled back against the trade that already
/// happened.
pub trait FillListener: Send + Sync {
    fn on_fill(&self, event: FillEvent);
}
