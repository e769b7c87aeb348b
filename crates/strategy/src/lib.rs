//! Trading strategies for the arbitrage simulator.
//!
//! A [`StrategyPolicy`] decides what to trade; a [`StrategyHost`] connects it
//! to the message bus and keeps its position ledger.

pub mod arbitrage;
pub mod host;
pub mod traits;

pub use arbitrage::{ArbitrageStrategy, DEFAULT_LEG_A, DEFAULT_LEG_B};
pub use host::{StrategyHost, HOST_KINDS};
pub use traits::{StrategyContext, StrategyPolicy};
