//! Latency-aware order matching.
//!
//! Orders wait in a per-instrument FIFO queue until the simulated clock has
//! moved past `sent_timestamp + latency`. They then fill against the quote
//! that was in effect *before* the update that released them, which models
//! the exchange seeing the market one update late.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use arbsim_core::{
    Error, LatencyMap, Message, MessageKind, Order, OrderSide, OrderType, Outbox, QuoteEvent,
    Result, Subscriber, Timestamp,
};
use tracing::debug;

/// Message kinds the matcher must be subscribed to.
pub const MATCHER_KINDS: [MessageKind; 2] = [MessageKind::QuoteUpdate, MessageKind::NewOrder];

/// Simulated exchange with per-instrument latency.
#[derive(Debug, Default)]
pub struct LatencyMatcher {
    /// Timestamp of the last quote seen, for any instrument.
    clock: Timestamp,
    /// Pending orders per security id, in submission order.
    queues: HashMap<String, VecDeque<Order>>,
    /// Last quote per security id.
    last_quotes: HashMap<String, Rc<QuoteEvent>>,
    /// Latency per security id.
    latencies: LatencyMap,
}

impl LatencyMatcher {
    /// Create a matcher. Instruments missing from `latencies` have zero latency.
    pub fn new(latencies: LatencyMap) -> Self {
        Self {
            latencies,
            ..Self::default()
        }
    }

    /// Queue `order`, stamping it with the current clock.
    pub fn submit_order(&mut self, order: &Order) {
        let mut order = order.clone();
        order.sent_timestamp = self.clock;
        debug!(
            security_id = order.security_id(),
            side = %order.side,
            order_type = %order.order_type,
            qty = order.qty,
            sent_ts = order.sent_timestamp,
            "order queued"
        );
        self.queues
            .entry(order.security_id().to_string())
            .or_default()
            .push_back(order);
    }

    /// Advance the clock to `quote` and release every order whose latency
    /// has elapsed, returning the fills in submission order.
    ///
    /// Fills are priced from the previous quote of the same instrument; with
    /// no previous quote nothing fills. `quote` becomes the previous quote for
    /// the next update either way.
    pub fn match_quote(&mut self, quote: &Rc<QuoteEvent>) -> Vec<Order> {
        self.clock = quote.timestamp;
        let security_id = quote.security_id();
        let latency = self.latency(security_id);

        let mut fills = Vec::new();
        if let (Some(queue), Some(prev)) = (
            self.queues.get_mut(security_id),
            self.last_quotes.get(security_id),
        ) {
            while queue
                .front()
                .is_some_and(|o| o.sent_timestamp.saturating_add(latency) < quote.timestamp)
            {
                let Some(mut order) = queue.pop_front() else {
                    break;
                };
                order.exec_price = fill_price(&order, prev);
                order.executed_timestamp = order.sent_timestamp.saturating_add(latency);
                debug!(
                    security_id,
                    side = %order.side,
                    qty = order.qty,
                    exec_price = order.exec_price,
                    executed_ts = order.executed_timestamp,
                    trigger_ts = quote.timestamp,
                    "order filled"
                );
                fills.push(order);
            }
        }

        self.last_quotes
            .insert(security_id.to_string(), Rc::clone(quote));
        fills
    }

    /// Current simulated clock.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// Latency for `security_id`.
    pub fn latency(&self, security_id: &str) -> Timestamp {
        self.latencies.get(security_id).copied().unwrap_or(0)
    }

    /// Orders waiting for `security_id`.
    pub fn pending_orders(&self, security_id: &str) -> usize {
        self.queues.get(security_id).map_or(0, VecDeque::len)
    }

    /// Orders waiting across all instruments.
    pub fn total_pending(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Last quote seen for `security_id`.
    pub fn last_quote(&self, security_id: &str) -> Option<&Rc<QuoteEvent>> {
        self.last_quotes.get(security_id)
    }
}

/// Buy at the ask, sell at the bid, stop-loss at the mid.
fn fill_price(order: &Order, quote: &QuoteEvent) -> f64 {
    match (order.order_type, order.side) {
        (OrderType::StopLoss, _) => quote.mid(),
        (OrderType::Market, OrderSide::Buy) => quote.ask_price,
        (OrderType::Market, OrderSide::Sell) => quote.bid_price,
    }
}

impl Subscriber for LatencyMatcher {
    fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()> {
        match message {
            Message::QuoteUpdate(quote) => {
                for fill in self.match_quote(quote) {
                    outbox.publish(Message::filled(fill));
                }
                Ok(())
            }
            Message::NewOrder(order) => {
                self.submit_order(order);
                Ok(())
            }
            other => Err(Error::protocol("LatencyMatcher", other.kind())),
        }
    }
}
