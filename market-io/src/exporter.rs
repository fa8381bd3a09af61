use engine::{MatchingEngine, PerformanceStats};
use matching_core::{BookSnapshot, Side, Trade};

const TRADE_HEADER: &str =
    "Trade ID,Timestamp,Symbol,Side,Quantity,Price,Value,Buyer ID,Seller ID,Buy Order ID,Sell Order ID";
const SNAPSHOT_HEADER: &str = "Symbol,Timestamp,Side,Price Level,Price,Quantity,Order Count,Cumulative Volume";
const STATS_HEADER: &str =
    "Total Trades,Total Volume,Trades Per Second,Orders Per Second,Avg Latency Ms,Active Orders,Runtime Seconds,Symbols Active";
const TRADER_PERFORMANCE_HEADER: &str = "Trader ID,Cash,Portfolio Value,PnL,Orders Sent,Orders Filled,Total Volume";

/// Renders a slice of trades as CSV, most-recent-last (caller's order is
/// preserved, not re-sorted).
pub fn trades_to_csv(trades: &[Trade]) -> String {
    let mut out = String::from(TRADE_HEADER);
    out.push('\n');
    for trade in trades {
        let value = trade.qty as f64 * trade.price;
        out.push_str(&format!(
            "{},{},{},{},{},{:.4},{:.2},{},{},{},{}\n",
            trade.trade_id.0,
            trade.ts.format("%Y-%m-%d %H:%M:%S%.6f"),
            trade.symbol,
            side_label(trade.aggressor_side),
            trade.qty,
            trade.price,
            value,
            trade.buyer_id,
            trade.seller_id,
            trade.buy_order_id.0,
            trade.sell_order_id.0,
        ));
    }
    out
}

/// Renders a book snapshot as CSV: bids best-to-worst, then asks
/// best-to-worst, cumulative volume restarting at each side.
pub fn book_snapshot_to_csv(snapshot: &BookSnapshot) -> String {
    let mut out = String::from(SNAPSHOT_HEADER);
    out.push('\n');
    let ts = snapshot.ts.format("%Y-%m-%d %H:%M:%S%.6f");

    let mut cumulative = 0i64;
    for (level, view) in snapshot.bids.iter().enumerate() {
        cumulative += view.total_qty;
        out.push_str(&format!(
            "{},{},BID,{},{:.4},{},{},{}\n",
            snapshot.symbol,
            ts,
            level + 1,
            view.price,
            view.total_qty,
            view.order_count,
            cumulative,
        ));
    }

    cumulative = 0;
    for (level, view) in snapshot.asks.iter().enumerate() {
        cumulative += view.total_qty;
        out.push_str(&format!(
            "{},{},ASK,{},{:.4},{},{},{}\n",
            snapshot.symbol,
            ts,
            level + 1,
            view.price,
            view.total_qty,
            view.order_count,
            cumulative,
        ));
    }

    out
}

pub fn performance_stats_to_csv(stats: &PerformanceStats) -> String {
    format!(
        "{STATS_HEADER}\n{},{},{:.4},{:.4},{:.4},{},{:.2},{}\n",
        stats.total_trades,
        stats.total_volume,
        stats.trades_per_second,
        stats.orders_per_second,
        stats.avg_latency_ms,
        stats.active_orders,
        stats.runtime_seconds,
        stats.symbols_active,
    )
}

/// One row per trader, in `rows` order. `rows` is `(trader_id, cash,
/// portfolio_value, pnl, orders_sent, orders_filled, total_volume)`.
pub fn trader_performance_to_csv(rows: &[(String, f64, f64, f64, u64, u64, i64)]) -> String {
    let mut out = String::from(TRADER_PERFORMANCE_HEADER);
    out.push('\n');
    for (trader_id, cash, portfolio_value, pnl, orders_sent, orders_filled, total_volume) in rows {
        out.push_str(&format!(
            "{trader_id},{cash:.2},{portfolio_value:.2},{pnl:.2},{orders_sent},{orders_filled},{total_volume}\n"
        ));
    }
    out
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

/// Convenience wrapper: exports every trade currently on the engine's
/// global tape.
pub fn export_all_trades(engine: &MatchingEngine) -> String {
    trades_to_csv(&engine.all_trades())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matching_core::{BookSnapshot, OrderId, PriceLevelView, TradeId};

    fn sample_trade() -> Trade {
        Trade {
            trade_id: TradeId::next(),
            ts: Utc::now(),
            symbol: "AAPL".into(),
            qty: 10,
            price: 150.5,
            buyer_id: "alice".into(),
            seller_id: "bob".into(),
            buy_order_id: OrderId::next(),
            sell_order_id: OrderId::next(),
            aggressor_side: Side::Buy,
        }
    }

    #[test]
    fn trades_to_csv_has_the_exact_header_and_one_row_per_trade() {
        let csv = trades_to_csv(&[sample_trade()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), TRADE_HEADER);
        let row = lines.next().unwrap();
        assert!(row.contains("AAPL"));
        assert!(row.contains("1505.00")); // value = 10 * 150.5
        assert!(row.contains("150.5000"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn book_snapshot_to_csv_restarts_cumulative_volume_per_side() {
        let snapshot = BookSnapshot {
            symbol: "AAPL".into(),
            ts: Utc::now(),
            bids: vec![
                PriceLevelView { price: 100.0, total_qty: 10, order_count: 1 },
                PriceLevelView { price: 99.0, total_qty: 5, order_count: 1 },
            ],
            asks: vec![PriceLevelView { price: 101.0, total_qty: 7, order_count: 2 }],
            best_bid: Some(100.0),
            best_ask: Some(101.0),
            spread: Some(1.0),
            mid_price: Some(100.5),
        };
        let csv = book_snapshot_to_csv(&snapshot);
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with(",10")); // first bid level: cumulative == its own qty
        assert!(rows[1].ends_with(",15")); // second bid level: 10 + 5
        assert!(rows[2].ends_with(",7")); // first ask level resets cumulative
    }
}
