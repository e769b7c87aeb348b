//! Simulation driver.
//!
//! Replays merged market data through the bus, one quote at a time, until the
//! source is exhausted. The matcher is always the first subscriber, so it
//! fills queued orders on a quote before strategies observe that quote.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use arbsim_core::{Config, InstrumentRegistry, LatencyMap, MessageBus, MessageKind, Result, Subscriber};
use arbsim_ingestion::{MarketReplaySource, QuoteFileFormat};
use tracing::info;

use crate::matcher::{LatencyMatcher, MATCHER_KINDS};

/// Replay source, bus and matcher wired together.
pub struct Simulation {
    bus: MessageBus,
    source: MarketReplaySource,
    matcher: Rc<RefCell<LatencyMatcher>>,
    /// Quotes replayed so far.
    steps: u64,
}

impl Simulation {
    /// Create a simulation over `source` with the given order latencies.
    pub fn new(source: MarketReplaySource, latencies: LatencyMap) -> Self {
        let matcher = Rc::new(RefCell::new(LatencyMatcher::new(latencies)));
        let mut bus = MessageBus::new();
        bus.subscribe(Rc::clone(&matcher), &MATCHER_KINDS);

        Self {
            bus,
            source,
            matcher,
            steps: 0,
        }
    }

    /// Load the configured datasets and latencies.
    pub fn from_config(config: &Config, registry: &InstrumentRegistry) -> Result<Self> {
        let source = MarketReplaySource::from_files(&config.data_files, registry, QuoteFileFormat::default())?;
        Ok(Self::new(source, config.latencies.clone()))
    }

    /// Register another subscriber after the ones already present.
    pub fn subscribe<S>(&mut self, subscriber: Rc<RefCell<S>>, kinds: &[MessageKind])
    where
        S: Subscriber + 'static,
    {
        self.bus.subscribe(subscriber, kinds);
    }

    /// Replay the next quote. Returns `false` once the source is exhausted.
    pub fn step(&mut self) -> Result<bool> {
        let stepped = self.source.step(&self.bus)?;
        if stepped {
            self.steps += 1;
        }
        Ok(stepped)
    }

    /// Replay every remaining quote, returning how many were replayed.
    pub fn run(&mut self) -> Result<u64> {
        info!(
            quotes = self.source.remaining(),
            subscribers = self.bus.subscriber_count(),
            first_ts = ?self.source.first_timestamp(),
            last_ts = ?self.source.last_timestamp(),
            "simulation started"
        );
        let start = self.steps;
        while self.step()? {}

        let replayed = self.steps - start;
        info!(
            replayed,
            pending_orders = self.matcher.borrow().total_pending(),
            "simulation finished"
        );
        Ok(replayed)
    }

    /// Quotes replayed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The simulated exchange.
    pub fn matcher(&self) -> Ref<'_, LatencyMatcher> {
        self.matcher.borrow()
    }

    /// The replay source.
    pub fn source(&self) -> &MarketReplaySource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionLedger, LEDGER_KINDS};
    use approx::assert_abs_diff_eq;
    use arbsim_core::{Message, Order, OrderSide, Outbox, QuoteEvent, Timestamp};

    fn make_quote(registry: &InstrumentRegistry, id: &str, ts: Timestamp, bid: f64, ask: f64) -> QuoteEvent {
        QuoteEvent {
            timestamp: ts,
            instrument: registry.get_or_create(id),
            bid_size: 1.0,
            bid_price: bid,
            ask_size: 1.0,
            ask_price: ask,
        }
    }

    /// Buys once on the first quote it sees.
    #[derive(Default)]
    struct BuyOnce {
        sent: bool,
        fills: Vec<Rc<Order>>,
    }

    impl Subscriber for BuyOnce {
        fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()> {
            match message {
                Message::QuoteUpdate(quote) if !self.sent => {
                    self.sent = true;
                    outbox.publish(Message::new_order(Order::market(
                        Rc::clone(&quote.instrument),
                        2.0,
                        OrderSide::Buy,
                    )));
                }
                Message::OrderFilled(order) => self.fills.push(Rc::clone(order)),
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn test_run_to_exhaustion() {
        let registry = InstrumentRegistry::new();
        let source = MarketReplaySource::from_quotes(vec![
            make_quote(&registry, "FutureA", 1, 100.0, 101.0),
            make_quote(&registry, "FutureA", 2, 102.0, 103.0),
            make_quote(&registry, "FutureA", 3, 104.0, 105.0),
        ]);
        let mut sim = Simulation::new(source, LatencyMap::new());
        let strategy = Rc::new(RefCell::new(BuyOnce::default()));
        let ledger = Rc::new(RefCell::new(PositionLedger::new()));
        sim.subscribe(Rc::clone(&strategy), &[MessageKind::QuoteUpdate, MessageKind::OrderFilled]);
        sim.subscribe(Rc::clone(&ledger), &LEDGER_KINDS);

        assert_eq!(sim.run().unwrap(), 3);
        assert!(!sim.step().unwrap());
        assert_eq!(sim.steps(), 3);

        // Sent at clock 1, filled on the quote at 2 against the quote at 1.
        let strategy = strategy.borrow();
        let fills = &strategy.fills;
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].sent_timestamp, 1);
        assert_eq!(fills[0].executed_timestamp, 1);
        assert_abs_diff_eq!(fills[0].exec_price, 101.0);

        // Marked at the last mid: (104.5 - 101) * 2.
        let ledger = ledger.borrow();
        assert_eq!(ledger.trades().len(), 1);
        assert_abs_diff_eq!(ledger.full_pnl(), 7.0, epsilon = 1e-9);
        assert_eq!(sim.matcher().total_pending(), 0);
        assert_eq!(sim.matcher().clock(), 3);
    }

    #[test]
    fn test_unfilled_order_stays_pending() {
        let registry = InstrumentRegistry::new();
        let source = MarketReplaySource::from_quotes(vec![make_quote(&registry, "FutureA", 1, 100.0, 101.0)]);
        let mut sim = Simulation::new(source, LatencyMap::new());
        let strategy = Rc::new(RefCell::new(BuyOnce::default()));
        sim.subscribe(Rc::clone(&strategy), &[MessageKind::QuoteUpdate, MessageKind::OrderFilled]);

        sim.run().unwrap();
        assert!(strategy.borrow().fills.is_empty());
        assert_eq!(sim.matcher().pending_orders("FutureA"), 1);
        assert!(sim.source().is_exhausted());
    }

    #[test]
    fn test_misrouted_subscription_fails_run() {
        let registry = InstrumentRegistry::new();
        let source = MarketReplaySource::from_quotes(vec![make_quote(&registry, "FutureA", 1, 100.0, 101.0)]);
        let mut sim = Simulation::new(source, LatencyMap::new());
        let ledger = Rc::new(RefCell::new(PositionLedger::new()));
        sim.subscribe(ledger, &[MessageKind::QuoteUpdate, MessageKind::NewOrder]);
        let strategy = Rc::new(RefCell::new(BuyOnce::default()));
        sim.subscribe(strategy, &[MessageKind::QuoteUpdate]);

        let err = sim.run().unwrap_err();
        assert!(matches!(
            err,
            arbsim_core::Error::Protocol {
                kind: MessageKind::NewOrder,
                ..
            }
        ));
    }
}
