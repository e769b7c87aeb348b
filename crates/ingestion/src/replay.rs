//! Time-ordered replay of merged quote datasets.
//!
//! All datasets are loaded upfront and merged into one sequence ordered by
//! timestamp. The sort is stable, so quotes with equal timestamps keep their
//! input order: dataset order first, then row order within a dataset. Fill
//! order for simultaneous quotes downstream depends on this.

use std::path::Path;
use std::rc::Rc;

use arbsim_core::{InstrumentRegistry, Message, MessageBus, QuoteEvent, Result, Timestamp};
use tracing::{info, trace};

use crate::loader::{load_quotes, QuoteFileFormat};

/// Single forward pass over merged quote events.
#[derive(Debug, Default)]
pub struct MarketReplaySource {
    quotes: Vec<Rc<QuoteEvent>>,
    cursor: usize,
}

impl MarketReplaySource {
    /// Load and merge the datasets at `paths`, in the given order.
    pub fn from_files<P: AsRef<Path>>(
        paths: &[P],
        registry: &InstrumentRegistry,
        format: QuoteFileFormat,
    ) -> Result<Self> {
        let mut datasets = Vec::with_capacity(paths.len());
        for path in paths {
            datasets.push(load_quotes(path, registry, format)?);
        }
        let source = Self::from_datasets(datasets);
        info!(
            datasets = paths.len(),
            quotes = source.len(),
            instruments = registry.len(),
            "market data loaded"
        );
        Ok(source)
    }

    /// Merge already parsed datasets, in the given order.
    pub fn from_datasets(datasets: Vec<Vec<QuoteEvent>>) -> Self {
        Self::from_quotes(datasets.into_iter().flatten().collect())
    }

    /// Replay `quotes`, stably sorted by timestamp.
    pub fn from_quotes(quotes: Vec<QuoteEvent>) -> Self {
        let mut quotes: Vec<Rc<QuoteEvent>> = quotes.into_iter().map(Rc::new).collect();
        quotes.sort_by_key(|q| q.timestamp);
        Self { quotes, cursor: 0 }
    }

    /// Publish the next quote on `bus`.
    ///
    /// Returns `Ok(false)` once every quote has been published, and keeps
    /// doing so on further calls.
    pub fn step(&mut self, bus: &MessageBus) -> Result<bool> {
        let Some(quote) = self.quotes.get(self.cursor) else {
            return Ok(false);
        };
        let quote = Rc::clone(quote);
        self.cursor += 1;

        trace!(ts = quote.timestamp, security_id = quote.security_id(), "replay quote");
        bus.publish(Message::QuoteUpdate(quote))?;
        Ok(true)
    }

    /// Total number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the source holds no quotes at all.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Quotes not yet published.
    pub fn remaining(&self) -> usize {
        self.quotes.len() - self.cursor
    }

    /// Whether every quote has been published.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.quotes.len()
    }

    /// Timestamp of the earliest quote.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.quotes.first().map(|q| q.timestamp)
    }

    /// Timestamp of the latest quote.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.quotes.last().map(|q| q.timestamp)
    }
}
