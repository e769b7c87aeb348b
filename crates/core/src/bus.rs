//! Synchronous publish/subscribe bus.
//!
//! The bus connects the replay source, the matcher and the strategy layer.
//! Dispatch is synchronous, in subscription order, and depth-first: messages
//! a handler publishes are delivered in full before the bus moves on to the
//! next subscriber of the outer message. Strategies rely on this to see the
//! fills of orders they just sent within the same tick.
//!
//! Handlers do not call the bus directly. They push messages into the
//! [`Outbox`] they are handed, and the bus flushes it as soon as the handler
//! returns, while the handler's own `RefCell` borrow has already been
//! released. A subscriber can therefore receive messages caused by its own
//! output without ever being borrowed twice.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::error::Result;
use crate::message::{Message, MessageKind};

/// A component that handles bus messages.
pub trait Subscriber {
    /// Handle one message. Anything pushed to `outbox` is published
    /// depth-first right after this call returns.
    fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()>;
}

/// Messages published by a handler during one call.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `message` for publication once the current handler returns.
    pub fn publish(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing was published.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take the queued messages in publication order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Message> {
        self.messages.drain(..)
    }
}

struct Subscription {
    kinds: Vec<MessageKind>,
    handler: Rc<RefCell<dyn Subscriber>>,
}

impl Subscription {
    fn accepts(&self, kind: MessageKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Ordered, kind-filtered fan-out of messages to subscribers.
#[derive(Default)]
pub struct MessageBus {
    subscriptions: Vec<Subscription>,
}

impl MessageBus {
    /// Create a bus without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for the given message kinds.
    ///
    /// Subscribers are invoked in registration order. A subscriber registered
    /// for a kind it cannot handle will fail the run with a protocol error the
    /// first time such a message is published.
    pub fn subscribe<S>(&mut self, subscriber: Rc<RefCell<S>>, kinds: &[MessageKind])
    where
        S: Subscriber + 'static,
    {
        let handler: Rc<RefCell<dyn Subscriber>> = subscriber;
        self.subscriptions.push(Subscription {
            kinds: kinds.to_vec(),
            handler,
        });
    }

    /// Number of registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Deliver `message` to every subscriber of its kind.
    ///
    /// The first handler error aborts the dispatch and is returned.
    pub fn publish(&self, message: Message) -> Result<()> {
        self.dispatch(&message, 0)
    }

    fn dispatch(&self, message: &Message, depth: usize) -> Result<()> {
        let kind = message.kind();
        trace!(?kind, depth, "dispatch");

        for subscription in self.subscriptions.iter().filter(|s| s.accepts(kind)) {
            let mut outbox = Outbox::new();
            subscription
                .handler
                .borrow_mut()
                .on_message(message, &mut outbox)?;

            for nested in outbox.drain() {
                self.dispatch(&nested, depth + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{Instrument, Order, OrderSide, QuoteEvent};

    fn make_quote(timestamp: u64) -> Message {
        Message::quote(QuoteEvent {
            timestamp,
            instrument: Rc::new(Instrument::new("FutureA")),
            bid_size: 1.0,
            bid_price: 100.0,
            ask_size: 1.0,
            ask_price: 101.0,
        })
    }

    fn make_order() -> Order {
        Order::market(Rc::new(Instrument::new("FutureA")), 1.0, OrderSide::Buy)
    }

    /// Records every message under its name into a shared journal.
    struct Recorder {
        name: &'static str,
        journal: Rc<RefCell<Vec<String>>>,
        /// Publish an order when a quote arrives.
        reply_with_order: bool,
    }

    impl Subscriber for Recorder {
        fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()> {
            self.journal
                .borrow_mut()
                .push(format!("{}:{:?}", self.name, message.kind()));
            if self.reply_with_order && message.kind() == MessageKind::QuoteUpdate {
                outbox.publish(Message::new_order(make_order()));
            }
            Ok(())
        }
    }

    /// Turns every new order into a fill.
    struct Filler {
        journal: Rc<RefCell<Vec<String>>>,
    }

    impl Subscriber for Filler {
        fn on_message(&mut self, message: &Message, outbox: &mut Outbox) -> Result<()> {
            self.journal.borrow_mut().push(format!("filler:{:?}", message.kind()));
            match message {
                Message::NewOrder(order) => {
                    outbox.publish(Message::filled(order.as_ref().clone()));
                    Ok(())
                }
                other => Err(Error::protocol("Filler", other.kind())),
            }
        }
    }

    fn recorder(name: &'static str, journal: &Rc<RefCell<Vec<String>>>, reply: bool) -> Rc<RefCell<Recorder>> {
        Rc::new(RefCell::new(Recorder {
            name,
            journal: Rc::clone(journal),
            reply_with_order: reply,
        }))
    }

    #[test]
    fn test_subscription_order() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        bus.subscribe(recorder("first", &journal, false), &[MessageKind::QuoteUpdate]);
        bus.subscribe(recorder("second", &journal, false), &[MessageKind::QuoteUpdate]);

        bus.publish(make_quote(1)).unwrap();

        assert_eq!(
            *journal.borrow(),
            vec!["first:QuoteUpdate", "second:QuoteUpdate"]
        );
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_kind_filter() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        bus.subscribe(recorder("fills", &journal, false), &[MessageKind::OrderFilled]);

        bus.publish(make_quote(1)).unwrap();
        assert!(journal.borrow().is_empty());
    }

    #[test]
    fn test_depth_first_dispatch() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        // The strategy sends an order on the quote; the filler fills it; the
        // strategy sees the fill before the late subscriber sees the quote.
        bus.subscribe(
            recorder("strategy", &journal, true),
            &[MessageKind::QuoteUpdate, MessageKind::OrderFilled],
        );
        bus.subscribe(
            Rc::new(RefCell::new(Filler {
                journal: Rc::clone(&journal),
            })),
            &[MessageKind::NewOrder],
        );
        bus.subscribe(recorder("late", &journal, false), &[MessageKind::QuoteUpdate]);

        bus.publish(make_quote(1)).unwrap();

        assert_eq!(
            *journal.borrow(),
            vec![
                "strategy:QuoteUpdate",
                "filler:NewOrder",
                "strategy:OrderFilled",
                "late:QuoteUpdate",
            ]
        );
    }

    #[test]
    fn test_handler_error_aborts_dispatch() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        bus.subscribe(
            Rc::new(RefCell::new(Filler {
                journal: Rc::clone(&journal),
            })),
            &[MessageKind::QuoteUpdate],
        );
        bus.subscribe(recorder("after", &journal, false), &[MessageKind::QuoteUpdate]);

        let err = bus.publish(make_quote(1)).unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol {
                kind: MessageKind::QuoteUpdate,
                ..
            }
        ));
        assert_eq!(*journal.borrow(), vec!["filler:QuoteUpdate"]);
    }
}
