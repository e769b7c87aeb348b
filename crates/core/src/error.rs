//! Error types for the arbitrage simulator.

use thiserror::Error;

use crate::message::MessageKind;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the arbitrage simulator.
///
/// Every variant is terminal for a run: the replay is deterministic and
/// offline, so nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (malformed dataset row).
    #[error("Data error: {0}")]
    Data(String),

    /// A component received a message kind it does not handle.
    #[error("Protocol error: {component} cannot handle {kind:?} messages")]
    Protocol {
        component: &'static str,
        kind: MessageKind,
    },

    /// Strategy-level invariant violation.
    #[error("Strategy error: {0}")]
    Strategy(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited file read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a protocol error for `component` receiving `kind`.
    pub fn protocol(component: &'static str, kind: MessageKind) -> Self {
        Error::Protocol { component, kind }
    }

    /// Create a strategy error.
    pub fn strategy(msg: impl Into<String>) -> Self {
        Error::Strategy(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_message() {
        let err = Error::protocol("LatencyMatcher", MessageKind::OrderFilled);
        assert_eq!(
            err.to_string(),
            "Protocol error: LatencyMatcher cannot handle OrderFilled messages"
        );
    }
}
