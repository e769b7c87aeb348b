//! Bus messages.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::types::{Order, QuoteEvent};

/// Discriminant of a [`Message`], used for subscriptions and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    QuoteUpdate,
    NewOrder,
    OrderFilled,
}

impl MessageKind {
    /// All kinds, in declaration order.
    pub const ALL: [MessageKind; 3] = [
        MessageKind::QuoteUpdate,
        MessageKind::NewOrder,
        MessageKind::OrderFilled,
    ];
}

/// A message dispatched on the [`MessageBus`](crate::bus::MessageBus).
///
/// Payloads are shared immutable values; cloning a message is cheap.
#[derive(Debug, Clone)]
pub enum Message {
    /// A new top-of-book quote from the replay source.
    QuoteUpdate(Rc<QuoteEvent>),
    /// An order submitted by a strategy, not yet stamped by the matcher.
    NewOrder(Rc<Order>),
    /// An order filled by the matcher.
    OrderFilled(Rc<Order>),
}

impl Message {
    /// Kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::QuoteUpdate(_) => MessageKind::QuoteUpdate,
            Message::NewOrder(_) => MessageKind::NewOrder,
            Message::OrderFilled(_) => MessageKind::OrderFilled,
        }
    }

    /// Wrap a quote.
    pub fn quote(quote: QuoteEvent) -> Self {
        Message::QuoteUpdate(Rc::new(quote))
    }

    /// Wrap a new order.
    pub fn new_order(order: Order) -> Self {
        Message::NewOrder(Rc::new(order))
    }

    /// Wrap a filled order.
    pub fn filled(order: Order) -> Self {
        Message::OrderFilled(Rc::new(order))
    }
}
