//! Core types and plumbing for the arbitrage simulator.
//!
//! This crate provides the pieces shared by every other crate:
//! - Instruments, quotes and orders
//! - The instrument registry
//! - Bus messages and the synchronous message bus
//! - Run configuration and the common error type

pub mod bus;
pub mod config;
pub mod error;
pub mod message;
pub mod registry;
pub mod types;

pub use bus::{MessageBus, Outbox, Subscriber};
pub use config::{Config, LatencyMap, StrategyConfig};
pub use error::{Error, Result};
pub use message::{Message, MessageKind};
pub use registry::InstrumentRegistry;
pub use types::*;
