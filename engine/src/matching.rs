use chrono::Utc;
use matching_core::{Order, OrderBook, OrderId, Side, Trade, TradeId};

use crate::trader_handle::FillEvent;

/// Result of crossing one incoming order against a book.
pub struct MatchOutcome {
    pub trades: Vec<Trade>,
    pub fills: Vec<FillEvent>,
    /// The incoming order's final state. Still carries whatever quantity
    /// is left to rest; the caller decides whether to add it to the book.
    pub taker: Order,
    /// Ids of resting orders that were fully filled and removed from the
    /// book during this call.
    pub removed_maker_ids: Vec<OrderId>,
}

/// Crosses `taker` against the opposite side of `book` until either the
/// taker is exhausted, inactive, or no longer crosses the best opposing
/// price. Trades always execute at the resting (maker) order's price.
/// Price-time priority follows directly from `OrderBook`'s own best-price
/// and FIFO-within-level guarantees — this function never reorders
/// anything, it only repeatedly asks the book for its current best.
///
/// Self-trading (taker and maker sharing a `trader_id`) is not special
/// cased: if the book crosses, it matches.
pub fn match_order(mut taker: Order, book: &mut OrderBook) -> MatchOutcome {
    let mut trades = Vec::new();
    let mut fills = Vec::new();
    let mut removed_maker_ids = Vec::new();
    let opposite = taker.side.opposite();

    loop {
        if taker.remaining_qty <= 0 || !taker.is_active() {
            break;
        }

        let crosses = match taker.side {
            Side::Buy => book.best_ask().is_some_and(|ask| taker.price >= ask),
            Side::Sell => book.best_bid().is_some_and(|bid| taker.price <= bid),
        };
        if !crosses {
            break;
        }

        let ts = Utc::now();
        let (maker_id, maker_trader, maker_price, fill_qty, maker_filled) = {
            let maker = book
                .best_order_mut(opposite)
                .expect("crossing condition implies a resting order exists");
            let maker_price = maker.price;
            let fill_qty = taker.remaining_qty.min(maker.remaining_qty);
            maker
                .apply_fill(fill_qty, maker_price, ts)
                .expect("fill_qty is bounded by maker.remaining_qty");
            (maker.id, maker.trader_id.clone(), maker_price, fill_qty, !maker.is_active())
        };

        taker
            .apply_fill(fill_qty, maker_price, ts)
            .expect("fill_qty is bounded by taker.remaining_qty");

        let (buy_order_id, sell_order_id, buyer_id, seller_id) = match taker.side {
            Side::Buy => (taker.id, maker_id, taker.trader_id.clone(), maker_trader.clone()),
            Side::Sell => (maker_id, taker.id, maker_trader.clone(), taker.trader_id.clone()),
        };

        let trade = Trade {
            trade_id: TradeId::next(),
            ts,
            symbol: book.symbol.clone(),
            qty: fill_qty,
            price: maker_price,
            buyer_id,
            seller_id,
            buy_order_id,
            sell_order_id,
            aggressor_side: taker.side,
        };
        book.record_trade(trade.clone());
        trades.push(trade);

        // Callback order follows the buyer-then-seller guarantee of the
        // engine's ordering contract, not "taker-then-maker" — the two
        // coincide only when the taker is the buyer.
        let (buyer_fill, seller_fill) = match taker.side {
            Side::Buy => (
                FillEvent {
                    order_id: taker.id,
                    trader_id: taker.trader_id.clone(),
                    symbol: book.symbol.clone(),
                    side: taker.side,
                    qty: fill_qty,
                    price: maker_price,
                    ts,
                },
                FillEvent {
                    order_id: maker_id,
                    trader_id: maker_trader,
                    symbol: book.symbol.clone(),
                    side: opposite,
                    qty: fill_qty,
                    price: maker_price,
                    ts,
                },
            ),
            Side::Sell => (
                FillEvent {
                    order_id: maker_id,
                    trader_id: maker_trader,
                    symbol: book.symbol.clone(),
                    side: opposite,
                    qty: fill_qty,
                    price: maker_price,
                    ts,
                },
                FillEvent {
                    order_id: taker.id,
                    trader_id: taker.trader_id.clone(),
                    symbol: book.symbol.clone(),
                    side: taker.side,
                    qty: fill_qty,
                    price: maker_price,
                    ts,
                },
            ),
        };
        fills.push(buyer_fill);
        fills.push(seller_fill);

        if maker_filled {
            book.remove_order(maker_id, opposite);
            removed_maker_ids.push(maker_id);
        }
    }

    MatchOutcome {
        trades,
        fills,
        taker,
        removed_maker_ids,
    }
}
