//! The matching engine: an ingest queue, a single matching worker
//! thread, and the per-symbol order books it drives (C4 in the
//! component breakdown). Crossing logic itself lives in `matching`, kept
//! separate from thread/lock plumbing so it can be tested directly
//! against a bare `OrderBook`.

pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod stats;
pub mod trader_handle;
pub mod types;

pub use config::EngineConfig;
pub use engine::MatchingEngine;
pub use error::EngineError;
pub use matching::{match_order, MatchOutcome};
pub use stats::PerformanceStats;
pub use trader_handle::{FillEvent, FillListener};
pub use types::SymbolSummary;
