//! Two-leg spread arbitrage.
//!
//! Trades one unit of each leg in opposite directions whenever the bid of one
//! leg exceeds the ask of the other by at least the entry spread, up to a
//! maximum net position. If the combined PnL of an open spread falls below
//! the stop-loss level, both legs are flattened and trading stops for the
//! rest of the run.

use std::rc::Rc;

use arbsim_core::{Error, Order, OrderSide, QuoteEvent, Result, StrategyConfig};
use tracing::{debug, warn};

use crate::traits::{StrategyContext, StrategyPolicy};

/// Default first leg.
pub const DEFAULT_LEG_A: &str = "FutureA";
/// Default second leg.
pub const DEFAULT_LEG_B: &str = "FutureB";

/// Spread arbitrage between two instruments.
#[derive(Debug, Clone)]
pub struct ArbitrageStrategy {
    config: StrategyConfig,
    leg_a: String,
    leg_b: String,
    /// Latest leg A quote.
    last_a: Option<Rc<QuoteEvent>>,
    /// Whether the last leg A order has been filled.
    a_confirmed: bool,
    /// Whether the last leg B order has been filled.
    b_confirmed: bool,
    /// Set once the stop-loss fired.
    trading_restricted: bool,
}

impl ArbitrageStrategy {
    /// Create a strategy trading the default legs.
    pub fn new(config: StrategyConfig) -> Self {
        Self::with_legs(config, DEFAULT_LEG_A, DEFAULT_LEG_B)
    }

    /// Create a strategy trading `leg_a` against `leg_b`.
    pub fn with_legs(config: StrategyConfig, leg_a: impl Into<String>, leg_b: impl Into<String>) -> Self {
        Self {
            config,
            leg_a: leg_a.into(),
            leg_b: leg_b.into(),
            last_a: None,
            a_confirmed: true,
            b_confirmed: true,
            trading_restricted: false,
        }
    }

    /// Whether the stop-loss has fired.
    pub fn is_trading_restricted(&self) -> bool {
        self.trading_restricted
    }

    /// Whether an order on either leg is still waiting for its fill.
    pub fn has_pending_orders(&self) -> bool {
        !(self.a_confirmed && self.b_confirmed)
    }

    fn mark_pending(&mut self) {
        self.a_confirmed = false;
        self.b_confirmed = false;
    }
}

impl StrategyPolicy for ArbitrageStrategy {
    fn on_quote(&mut self, quote: &Rc<QuoteEvent>, ctx: &mut StrategyContext<'_>) -> Result<()> {
        if quote.security_id() == self.leg_a {
            self.last_a = Some(Rc::clone(quote));
            return Ok(());
        }
        if quote.security_id() != self.leg_b {
            return Ok(());
        }
        let Some(last_a) = self.last_a.clone() else {
            return Ok(());
        };
        if self.has_pending_orders() {
            return Ok(());
        }

        let position_a = ctx.position(&self.leg_a);
        let position_b = ctx.position(&self.leg_b);
        let net_a = position_a.net_qty();

        if net_a != -position_b.net_qty() {
            return Err(Error::strategy(format!(
                "legs are not in sync: {} net {}, {} net {}",
                self.leg_a,
                net_a,
                self.leg_b,
                position_b.net_qty()
            )));
        }
        if net_a.abs() > self.config.max_position {
            return Err(Error::strategy(format!(
                "max position breached: {} net {} exceeds {}",
                self.leg_a, net_a, self.config.max_position
            )));
        }
        if self.trading_restricted {
            return Ok(());
        }

        let pnl_a = position_a.pnl();
        let pnl_b = position_b.pnl();
        if net_a != 0.0 && pnl_a + pnl_b < self.config.stop_loss {
            warn!(
                ts = quote.timestamp,
                pnl_a,
                pnl_b,
                stop_loss = self.config.stop_loss,
                "stop-loss triggered, flattening both legs"
            );
            ctx.send_stop_loss(&self.leg_a);
            ctx.send_stop_loss(&self.leg_b);
            self.mark_pending();
            self.trading_restricted = true;
            return Ok(());
        }

        let max = self.config.max_position;
        let spread = self.config.entry_spread;
        if net_a > -max && last_a.bid_price - quote.ask_price >= spread {
            debug!(ts = quote.timestamp, a_bid = last_a.bid_price, b_ask = quote.ask_price, "sell spread");
            ctx.send_market_order(&self.leg_a, 1.0, OrderSide::Sell);
            ctx.send_market_order(&self.leg_b, 1.0, OrderSide::Buy);
            self.mark_pending();
        } else if net_a < max && quote.bid_price - last_a.ask_price >= spread {
            debug!(ts = quote.timestamp, b_bid = quote.bid_price, a_ask = last_a.ask_price, "buy spread");
            ctx.send_market_order(&self.leg_a, 1.0, OrderSide::Buy);
            ctx.send_market_order(&self.leg_b, 1.0, OrderSide::Sell);
            self.mark_pending();
        }
        Ok(())
    }

    fn on_fill(&mut self, order: &Order, _ctx: &mut StrategyContext<'_>) -> Result<()> {
        if order.security_id() == self.leg_a {
            self.a_confirmed = true;
        } else if order.security_id() == self.leg_b {
            self.b_confirmed = true;
        } else {
            return Err(Error::strategy(format!(
                "fill for unknown instrument {}",
                order.security_id()
            )));
        }
        Ok(())
    }
}
