//! Structural primitives for a limit order book with price-time priority.
//!
//! This crate owns the data model and the priority structures (C1 `Order`,
//! C2 `BookSide`, C3 `OrderBook`) but performs no matching itself — crossing
//! two orders, applying fills to both sides, and emitting trades is the
//! matching engine's job, built on top of the public API here.

pub mod book_side;
pub mod error;
pub mod order;
pub mod order_book;
pub mod price;

pub use book_side::{BookSide, PriceLevelView};
pub use error::CoreError;
pub use order::{Fill, Order, OrderId, OrderStatus, Side};
pub use order_book::{BookSnapshot, OrderBook, Trade, TradeId, DEFAULT_TRADE_TAPE_CAPACITY};
pub use price::Price;
