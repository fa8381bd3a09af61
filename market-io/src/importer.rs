use chrono::{DateTime, Utc};
use engine::MatchingEngine;
use matching_core::{Order, Side};

use crate::error::ImportError;

const REQUIRED_COLUMNS: [&str; 5] = ["trader_id", "symbol", "side", "quantity", "price"];

/// Result of importing a CSV order file: how many rows made it into the
/// engine and the per-row failures for everything else. A bad row never
/// aborts the rest of the file; only a missing required column does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rows_submitted: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Parses `trader_id,symbol,side,quantity,price[,timestamp]` rows (header
/// required, column order and case insignificant) and submits each one to
/// `engine`. `symbol` and `side` are uppercased on ingest.
pub fn import_orders(csv_text: &str, engine: &MatchingEngine) -> Result<ImportReport, ImportError> {
    let mut lines = csv_text.lines().filter(|line| !line.trim().is_empty());
    let header_line = lines.next().ok_or(ImportError::EmptyInput)?;
    let headers: Vec<String> = split_csv_line(header_line).into_iter().map(|h| h.trim().to_lowercase()).collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing.join(", ")));
    }

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let (trader_idx, symbol_idx, side_idx, qty_idx, price_idx) =
        (col("trader_id"), col("symbol"), col("side"), col("quantity"), col("price"));
    let ts_idx = headers.iter().position(|h| h == "timestamp");

    let mut report = ImportReport::default();

    for (offset, line) in lines.enumerate() {
        let row_num = offset + 2; // 1-indexed, header occupies row 1
        let fields = split_csv_line(line);

        match parse_row(&fields, trader_idx, symbol_idx, side_idx, qty_idx, price_idx, ts_idx) {
            Ok((trader_id, symbol, side, qty, price, ts)) => match Order::new(trader_id, symbol, side, qty, price) {
                Ok(mut order) => {
                    if let Some(ts) = ts {
                        order.created_ts = ts;
                    }
                    match engine.submit(order) {
                        Ok(_) => report.rows_submitted += 1,
                        Err(err) => {
                            report.rows_failed += 1;
                            report.errors.push(format!("row {row_num}: {err}"));
                        }
                    }
                }
                Err(err) => {
                    report.rows_failed += 1;
                    report.errors.push(format!("row {row_num}: {err}"));
                }
            },
            Err(msg) => {
                report.rows_failed += 1;
                report.errors.push(format!("row {row_num}: {msg}"));
            }
        }
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn parse_row(
    fields: &[String],
    trader_idx: usize,
    symbol_idx: usize,
    side_idx: usize,
    qty_idx: usize,
    price_idx: usize,
    ts_idx: Option<usize>,
) -> Result<(String, String, Side, i64, f64, Option<DateTime<Utc>>), String> {
    let field = |idx: usize| -> Result<&str, String> {
        fields.get(idx).map(|s| s.trim()).ok_or_else(|| "row has fewer columns than the header".to_string())
    };

    let trader_id = field(trader_idx)?.to_string();
    if trader_id.is_empty() {
        return Err("trader_id is empty".into());
    }

    let symbol = field(symbol_idx)?.to_uppercase();
    if symbol.is_empty() {
        return Err("symbol is empty".into());
    }

    let side = match field(side_idx)?.to_uppercase().as_str() {
        "BUY" => Side::Buy,
        "SELL" => Side::Sell,
        other => return Err(format!("invalid side '{other}', must be BUY or SELL")),
    };

    let qty: i64 = field(qty_idx)?.parse().map_err(|_| "quantity is not an integer".to_string())?;
    if qty <= 0 {
        return Err("quantity must be positive".into());
    }

    let price: f64 = field(price_idx)?.parse().map_err(|_| "price is not numeric".to_string())?;
    if !(price.is_finite() && price > 0.0) {
        return Err("price must be positive".into());
    }

    let ts = match ts_idx {
        Some(idx) => match fields.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_timestamp(raw).unwrap_or_else(Utc::now)),
            None => None,
        },
        None => None,
    };

    Ok((trader_id, symbol, side, qty, price, ts))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

/// Splits one CSV line on commas, honoring double-quoted fields that may
/// themselves contain commas. Not a general RFC 4180 parser: escaped
/// quotes inside a quoted field aren't supported, which every row this
/// importer expects (ids, symbols, numbers) never needs.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::EngineConfig;

    #[test]
    fn rejects_header_missing_a_required_column() {
        let engine = MatchingEngine::new(EngineConfig::default());
        let csv = "trader_id,symbol,side,quantity\nT1,AAPL,BUY,10\n";
        let err = import_orders(csv, &engine).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns(_)));
    }

    #[test]
    fn submits_valid_rows_and_collects_per_row_errors() {
        let engine = MatchingEngine::new(EngineConfig::default());
        engine.start();
        let csv = "\
trader_id,symbol,side,quantity,price
T1,aapl,buy,100,150.25
T2,AAPL,SELL,-5,150.50
T3,AAPL,sell,75,not_a_number
T4,AAPL,BUY,50,2800.75
";
        let report = import_orders(csv, &engine).unwrap();
        assert_eq!(report.rows_submitted, 2);
        assert_eq!(report.rows_failed, 2);
        assert_eq!(report.errors.len(), 2);
        engine.stop();
    }

    #[test]
    fn symbol_and_side_are_uppercased_on_ingest() {
        let engine = MatchingEngine::new(EngineConfig::default());
        engine.start();
        let csv = "trader_id,symbol,side,quantity,price\nT1,aapl,buy,10,100.0\n";
        let report = import_orders(csv, &engine).unwrap();
        assert_eq!(report.rows_submitted, 1);
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(engine.orderbook_snapshot("AAPL", 1).is_some());
        engine.stop();
    }

    #[test]
    fn column_order_and_case_do_not_matter() {
        let engine = MatchingEngine::new(EngineConfig::default());
        engine.start();
        let csv = "PRICE,QUANTITY,Side,Symbol,Trader_Id\n100.0,10,BUY,AAPL,T1\n";
        let report = import_orders(csv, &engine).unwrap();
        assert_eq!(report.rows_submitted, 1);
        engine.stop();
    }
}
