//! Strategy interface and the context strategies act through.

use std::rc::Rc;

use arbsim_backtest::{Position, PositionLedger};
use arbsim_core::{
    InstrumentRef, InstrumentRegistry, Message, Order, OrderSide, Outbox, QuoteEvent, Result,
};
use tracing::debug;

/// Trading decision policy driven by quotes and fills.
pub trait StrategyPolicy {
    /// React to a quote. The host has already marked the ledger.
    fn on_quote(&mut self, quote: &Rc<QuoteEvent>, ctx: &mut StrategyContext<'_>) -> Result<()>;

    /// React to one of our orders being filled. The host has already booked
    /// the fill in the ledger.
    fn on_fill(&mut self, order: &Order, ctx: &mut StrategyContext<'_>) -> Result<()>;
}

/// What a strategy can see and do while handling an event.
///
/// Read access to positions and trades, plus order emission. Orders are
/// published on the bus once the current handler returns.
pub struct StrategyContext<'a> {
    ledger: &'a PositionLedger,
    registry: &'a InstrumentRegistry,
    outbox: &'a mut Outbox,
}

impl<'a> StrategyContext<'a> {
    /// Create a context over the given ledger, registry and outbox.
    pub fn new(
        ledger: &'a PositionLedger,
        registry: &'a InstrumentRegistry,
        outbox: &'a mut Outbox,
    ) -> Self {
        Self {
            ledger,
            registry,
            outbox,
        }
    }

    /// Position in `security_id`.
    pub fn position(&self, security_id: &str) -> Position {
        self.ledger.position(security_id)
    }

    /// PnL over all instruments.
    pub fn full_pnl(&self) -> f64 {
        self.ledger.full_pnl()
    }

    /// Filled orders so far.
    pub fn trades(&self) -> &[Rc<Order>] {
        self.ledger.trades()
    }

    /// Handle for `security_id`.
    pub fn instrument(&self, security_id: &str) -> InstrumentRef {
        self.registry.get_or_create(security_id)
    }

    /// Submit `order` to the matcher.
    pub fn send_order(&mut self, order: Order) {
        debug!(
            security_id = order.security_id(),
            side = %order.side,
            order_type = %order.order_type,
            qty = order.qty,
            "order sent"
        );
        self.outbox.publish(Message::new_order(order));
    }

    /// Submit a market order.
    pub fn send_market_order(&mut self, security_id: &str, qty: f64, side: OrderSide) {
        let order = Order::market(self.instrument(security_id), qty, side);
        self.send_order(order);
    }

    /// Flatten the net position in `security_id` with a stop-loss order.
    ///
    /// Returns `false` without sending anything when the position is flat.
    pub fn send_stop_loss(&mut self, security_id: &str) -> bool {
        let net = self.position(security_id).net_qty();
        if net == 0.0 {
            return false;
        }
        let side = if net > 0.0 { OrderSide::Sell } else { OrderSide::Buy };
        let order = Order::stop_loss(self.instrument(security_id), net.abs(), side);
        self.send_order(order);
        true
    }
}
