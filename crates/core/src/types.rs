//! Core data types for the arbitrage simulator.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Event timestamp in source units (monotonic source order, not wall-clock).
pub type Timestamp = u64;

/// Shared handle to an interned instrument.
pub type InstrumentRef = Rc<Instrument>;

/// A tradable security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique security identifier (e.g., "FutureA").
    pub security_id: String,
    /// Tick size. Informational only.
    pub price_step: f64,
}

impl Instrument {
    /// Default tick size for instruments created on first sight.
    pub const DEFAULT_PRICE_STEP: f64 = 1.0;

    /// Create an instrument with the default tick size.
    pub fn new(security_id: impl Into<String>) -> Self {
        Self {
            security_id: security_id.into(),
            price_step: Self::DEFAULT_PRICE_STEP,
        }
    }
}

/// A Level 1 quote update (best bid/ask) for one instrument.
///
/// `ask_price >= bid_price` is not checked; crossed quotes pass through.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteEvent {
    /// Source timestamp.
    pub timestamp: Timestamp,
    /// Quoted instrument.
    pub instrument: InstrumentRef,
    /// Best bid size.
    pub bid_size: f64,
    /// Best bid price.
    pub bid_price: f64,
    /// Best ask size.
    pub ask_size: f64,
    /// Best ask price.
    pub ask_price: f64,
}

impl QuoteEvent {
    /// Security id of the quoted instrument.
    #[inline]
    pub fn security_id(&self) -> &str {
        &self.instrument.security_id
    }

    /// Calculate mid price.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    /// Calculate spread.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Get sign: +1 for buy, -1 for sell.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }

    /// Label used in trade reports.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Fills at the aggressive side of the book.
    #[default]
    Market,
    /// Fills at the bid/ask midpoint regardless of side.
    StopLoss,
}

impl OrderType {
    /// Label used in trade reports.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Market => "Market",
            OrderType::StopLoss => "StopLoss",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order travelling through the matcher.
///
/// The matcher stamps `sent_timestamp` on submission and
/// `exec_price`/`executed_timestamp` on fill. Filled orders are shared as
/// `Rc<Order>` and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Instrument to trade.
    pub instrument: InstrumentRef,
    /// Quantity (positive).
    pub qty: f64,
    /// Side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Execution price (0 until filled).
    pub exec_price: f64,
    /// Simulated clock at submission.
    pub sent_timestamp: Timestamp,
    /// Simulated fill time (`sent_timestamp + latency`).
    pub executed_timestamp: Timestamp,
}

impl Order {
    /// Create an unsent market order.
    pub fn market(instrument: InstrumentRef, qty: f64, side: OrderSide) -> Self {
        Self::new(instrument, qty, side, OrderType::Market)
    }

    /// Create an unsent stop-loss order.
    pub fn stop_loss(instrument: InstrumentRef, qty: f64, side: OrderSide) -> Self {
        Self::new(instrument, qty, side, OrderType::StopLoss)
    }

    /// Create an unsent order.
    pub fn new(instrument: InstrumentRef, qty: f64, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            instrument,
            qty,
            side,
            order_type,
            exec_price: 0.0,
            sent_timestamp: 0,
            executed_timestamp: 0,
        }
    }

    /// Security id of the traded instrument.
    #[inline]
    pub fn security_id(&self) -> &str {
        &self.instrument.security_id
    }

    /// Signed quantity (positive for buys, negative for sells).
    #[inline]
    pub fn signed_qty(&self) -> f64 {
        self.qty * self.side.sign()
    }

    /// Simulated delay between submission and fill.
    #[inline]
    pub fn fill_delay(&self) -> Timestamp {
        self.executed_timestamp.saturating_sub(self.sent_timestamp)
    }
}
