//! Backtesting engine for the arbitrage simulator.
//!
//! This crate provides:
//! - Latency-aware order matching against replayed quotes
//! - Position tracking and P&L calculation
//! - The simulation driver loop
//! - Run metrics and the trade report

pub mod matcher;
pub mod metrics;
pub mod position;
pub mod report;
pub mod simulator;

pub use matcher::{LatencyMatcher, MATCHER_KINDS};
pub use metrics::RunMetrics;
pub use position::{Position, PositionLedger, LEDGER_KINDS, PNL_PRECISION};
pub use report::{write_trade_report, write_trades};
pub use simulator::Simulation;
