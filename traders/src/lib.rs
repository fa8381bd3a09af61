//! Simulated trading agents that generate order flow against a
//! `MatchingEngine` and track their own portfolio from fills.

pub mod config;
pub mod distributions;
pub mod trader;

pub use config::TraderConfig;
pub use trader::TraderAgent;
