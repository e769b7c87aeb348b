//! Position tracking and PnL.
//!
//! Tracks bought and sold quantities with their volume-weighted average
//! prices per instrument, and the filled orders in fill order.

use std::collections::BTreeMap;
use std::rc::Rc;

use arbsim_core::{Error, Message, MessageKind, Order, OrderSide, Outbox, QuoteEvent, Result, Subscriber};

/// PnL is quantized to this step to suppress floating point noise.
pub const PNL_PRECISION: f64 = 1e-8;

/// Message kinds the ledger must be subscribed to.
pub const LEDGER_KINDS: [MessageKind; 2] = [MessageKind::QuoteUpdate, MessageKind::OrderFilled];

/// Position in a single instrument.
///
/// Bought and sold quantities only ever grow; the net quantity is derived.
/// Average prices are 0 until their side has traded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    /// Total quantity bought.
    pub qty_bought: f64,
    /// Total quantity sold.
    pub qty_sold: f64,
    /// Volume-weighted average buy price.
    pub avg_price_bought: f64,
    /// Volume-weighted average sell price.
    pub avg_price_sold: f64,
    /// Last mark (quote mid).
    pub current_price: f64,
}

impl Position {
    /// Net quantity (positive = long, negative = short).
    #[inline]
    pub fn net_qty(&self) -> f64 {
        self.qty_bought - self.qty_sold
    }

    /// Whether the position is flat.
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.net_qty() == 0.0
    }

    /// Record a fill of `qty` at `price`.
    pub fn on_trade(&mut self, qty: f64, price: f64, side: OrderSide) {
        match side {
            OrderSide::Buy => {
                let total = self.qty_bought + qty;
                self.avg_price_bought =
                    self.avg_price_bought * self.qty_bought / total + price * qty / total;
                self.qty_bought = total;
            }
            OrderSide::Sell => {
                let total = self.qty_sold + qty;
                self.avg_price_sold = self.avg_price_sold * self.qty_sold / total + price * qty / total;
                self.qty_sold = total;
            }
        }
    }

    /// Update the mark.
    #[inline]
    pub fn on_mark(&mut self, price: f64) {
        self.current_price = price;
    }

    /// Realized plus unrealized PnL.
    ///
    /// The unmatched side of the position is closed synthetically at the
    /// current mark, so the result is always
    /// `(effective sell avg - effective buy avg) * max(bought, sold)`.
    pub fn pnl(&self) -> f64 {
        let net = self.net_qty();
        let raw = if net >= 0.0 {
            if self.qty_bought == 0.0 {
                return 0.0;
            }
            let total = self.qty_sold + net;
            let sold = self.avg_price_sold * self.qty_sold / total + self.current_price * net / total;
            (sold - self.avg_price_bought) * self.qty_bought
        } else {
            if self.qty_sold == 0.0 {
                return 0.0;
            }
            let bought = self.avg_price_bought * self.qty_bought / self.qty_sold
                + self.current_price * (-net) / self.qty_sold;
            (self.avg_price_sold - bought) * self.qty_sold
        };
        quantize(raw)
    }
}

fn quantize(value: f64) -> f64 {
    (value / PNL_PRECISION).round() * PNL_PRECISION
}

/// Positions per instrument plus the trade log.
#[derive(Debug, Default)]
pub struct PositionLedger {
    /// Positions keyed by security id.
    positions: BTreeMap<String, Position>,
    /// Filled orders, in fill order.
    trades: Vec<Rc<Order>>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the quoted instrument at the quote mid.
    pub fn on_quote_update(&mut self, quote: &QuoteEvent) {
        self.position_mut(quote.security_id()).on_mark(quote.mid());
    }

    /// Record a filled order.
    pub fn on_order_filled(&mut self, order: Rc<Order>) {
        self.position_mut(order.security_id())
            .on_trade(order.qty, order.exec_price, order.side);
        self.trades.push(order);
    }

    /// Position in `security_id`; flat if never quoted or traded.
    pub fn position(&self, security_id: &str) -> Position {
        self.positions.get(security_id).copied().unwrap_or_default()
    }

    /// PnL of `security_id`.
    pub fn pnl(&self, security_id: &str) -> f64 {
        self.position(security_id).pnl()
    }

    /// PnL summed over all instruments, in security id order.
    pub fn full_pnl(&self) -> f64 {
        self.positions.values().map(Position::pnl).sum()
    }

    /// Filled orders, in fill order.
    pub fn trades(&self) -> &[Rc<Order>] {
        &self.trades
    }

    /// Iterate positions in security id order.
    pub fn positions(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.positions.iter().map(|(id, p)| (id.as_str(), p))
    }

    fn position_mut(&mut self, security_id: &str) -> &mut Position {
        self.positions.entry(security_id.to_string()).or_default()
    }
}

impl Subscriber for PositionLedger {
    fn on_message(&mut self, message: &Message, _outbox: &mut Outbox) -> Result<()> {
        match message {
            Message::QuoteUpdate(quote) => {
                self.on_quote_update(quote);
                Ok(())
            }
            Message::OrderFilled(order) => {
                self.on_order_filled(Rc::clone(order));
                Ok(())
            }
            other => Err(Error::protocol("PositionLedger", other.kind())),
        }
    }
}
