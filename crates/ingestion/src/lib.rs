//! Market data ingestion for the arbitrage simulator.
//!
//! This crate handles:
//! - Parsing quote datasets into quote events
//! - Merging datasets into one time-ordered replay

pub mod loader;
pub mod replay;

pub use loader::{load_quotes, parse_quotes, QuoteFileFormat};
pub use replay::MarketReplaySource;
