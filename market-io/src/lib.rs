//! CSV import/export adapters over the matching engine: thin, stateless
//! layers that never touch the book directly.

pub mod error;
pub mod exporter;
pub mod importer;

pub use error::ImportError;
pub use exporter::{book_snapshot_to_csv, export_all_trades, performance_stats_to_csv, trader_performance_to_csv, trades_to_csv};
pub use importer::{import_orders, ImportReport};
