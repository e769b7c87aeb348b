//! Run metrics.
//!
//! Summarizes the trade log and positions of a [`PositionLedger`] after a run.

use std::collections::BTreeMap;

use arbsim_core::{OrderSide, OrderType};

use crate::position::PositionLedger;

/// Performance summary of a simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Total number of fills.
    pub total_trades: u32,
    /// Buy fills.
    pub buy_trades: u32,
    /// Sell fills.
    pub sell_trades: u32,
    /// Market order fills.
    pub market_trades: u32,
    /// Stop-loss order fills.
    pub stop_loss_trades: u32,
    /// Sum of filled quantity.
    pub traded_qty: f64,
    /// Sum of `qty * exec_price`.
    pub traded_notional: f64,
    /// Mean of `executed_timestamp - sent_timestamp`.
    pub avg_fill_delay: f64,
    /// PnL per security id.
    pub pnl_by_instrument: BTreeMap<String, f64>,
    /// PnL over all instruments.
    pub full_pnl: f64,
}

impl RunMetrics {
    /// Compute metrics from `ledger`.
    pub fn from_ledger(ledger: &PositionLedger) -> Self {
        let mut metrics = RunMetrics::default();
        let mut total_delay = 0u128;

        for order in ledger.trades() {
            metrics.total_trades += 1;
            match order.side {
                OrderSide::Buy => metrics.buy_trades += 1,
                OrderSide::Sell => metrics.sell_trades += 1,
            }
            match order.order_type {
                OrderType::Market => metrics.market_trades += 1,
                OrderType::StopLoss => metrics.stop_loss_trades += 1,
            }
            metrics.traded_qty += order.qty;
            metrics.traded_notional += order.qty * order.exec_price;
            total_delay += u128::from(order.fill_delay());
        }

        metrics.avg_fill_delay = if metrics.total_trades > 0 {
            total_delay as f64 / metrics.total_trades as f64
        } else {
            0.0
        };

        metrics.pnl_by_instrument = ledger
            .positions()
            .map(|(id, position)| (id.to_string(), position.pnl()))
            .collect();
        metrics.full_pnl = ledger.full_pnl();

        metrics
    }
}
