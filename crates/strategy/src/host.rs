//! Bus adapter for strategies.

use std::rc::Rc;

use arbsim_backtest::PositionLedger;
use arbsim_core::{Error, InstrumentRegistry, Message, MessageKind, Outbox, Result, Subscriber};

use crate::traits::{StrategyContext, StrategyPolicy};

/// Message kinds a strategy host must be subscribed to.
pub const HOST_KINDS: [MessageKind; 2] = [MessageKind::QuoteUpdate, MessageKind::OrderFilled];

/// Runs a [`StrategyPolicy`] on the bus with its own position ledger.
///
/// Every quote and fill is booked in the ledger before the policy sees it,
/// so the policy always reads positions that include the current event.
pub struct StrategyHost<P> {
    ledger: PositionLedger,
    registry: Rc<InstrumentRegistry>,
    policy: P,
}

impl<P: StrategyPolicy> StrategyHost<P> {
    /// Wrap `policy`. `registry` resolves the instruments the policy trades.
    pub fn new(policy: P, registry: Rc<InstrumentRegistry>) -> Self {
        Self {
            ledger: PositionLedger::new(),
            registry,
            policy,
        }
    }

    /// The strategy's positions and trades.
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// The wrapped policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the wrapped policy.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// PnL over all instruments.
    pub fn full_pnl(&self) -> f64 {
        self.ledger.full_pnl()
    }
}

impl<P: StrategyPolicy> Subscriber for StrategyHost<P> {
    fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()> {
        match message {
            Message::QuoteUpdate(quote) => {
                self.ledger.on_quote_update(quote);
                let mut ctx = StrategyContext::new(&self.ledger, &self.registry, outbox);
                self.policy.on_quote(quote, &mut ctx)
            }
            Message::OrderFilled(order) => {
                self.ledger.on_order_filled(Rc::clone(order));
                let mut ctx = StrategyContext::new(&self.ledger, &self.registry, outbox);
                self.policy.on_fill(order, &mut ctx)
            }
            other => Err(Error::protocol("StrategyHost", other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use arbsim_core::{Order, OrderSide, QuoteEvent};

    /// Records what it saw, including the position at that moment.
    #[derive(Default)]
    struct Probe {
        net_on_fill: Vec<f64>,
        marks_on_quote: Vec<f64>,
    }

    impl StrategyPolicy for Probe {
        fn on_quote(&mut self, quote: &Rc<QuoteEvent>, ctx: &mut StrategyContext<'_>) -> Result<()> {
            self.marks_on_quote
                .push(ctx.position(quote.security_id()).current_price);
            Ok(())
        }

        fn on_fill(&mut self, order: &Order, ctx: &mut StrategyContext<'_>) -> Result<()> {
            self.net_on_fill.push(ctx.position(order.security_id()).net_qty());
            Ok(())
        }
    }

    #[test]
    fn test_ledger_updated_before_policy() {
        let registry = Rc::new(InstrumentRegistry::new());
        let mut host = StrategyHost::new(Probe::default(), Rc::clone(&registry));
        let mut outbox = Outbox::new();
        let a = registry.get_or_create("FutureA");

        host.on_message(
            &Message::quote(QuoteEvent {
                timestamp: 1,
                instrument: Rc::clone(&a),
                bid_size: 1.0,
                bid_price: 99.0,
                ask_size: 1.0,
                ask_price: 101.0,
            }),
            &mut outbox,
        )
        .unwrap();

        let mut order = Order::market(a, 2.0, OrderSide::Buy);
        order.exec_price = 101.0;
        host.on_message(&Message::filled(order), &mut outbox).unwrap();

        assert_eq!(host.policy().marks_on_quote, vec![100.0]);
        assert_eq!(host.policy().net_on_fill, vec![2.0]);
        assert_eq!(host.ledger().trades().len(), 1);
        assert_abs_diff_eq!(host.full_pnl(), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_new_order_messages() {
        let registry = Rc::new(InstrumentRegistry::new());
        let mut host = StrategyHost::new(Probe::default(), Rc::clone(&registry));
        let order = Order::market(registry.get_or_create("FutureA"), 1.0, OrderSide::Buy);

        let err = host
            .on_message(&Message::new_order(order), &mut Outbox::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                component: "StrategyHost",
                kind: MessageKind::NewOrder
            }
        ));
    }
}
