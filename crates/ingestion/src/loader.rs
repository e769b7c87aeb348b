//! Quote dataset loading.
//!
//! A dataset is a delimited file with seven fields per row:
//!
//! ```text
//! timestamp,securityId,<unused>,bidSize,bidPrice,askPrice,askSize
//! 1544166006171067563,FutureB,2,5,10922,10927,3
//! ```
//!
//! Note the ask columns are in price-then-size order, unlike the bid columns.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use arbsim_core::{Error, InstrumentRegistry, QuoteEvent, Result};
use tracing::debug;

/// Number of fields in a dataset row.
pub const QUOTE_FIELDS: usize = 7;

/// Layout options for quote datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteFileFormat {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row is a header to skip.
    pub has_headers: bool,
}

impl Default for QuoteFileFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
        }
    }
}

/// Load every row of the dataset at `path`, in file order.
pub fn load_quotes(
    path: impl AsRef<Path>,
    registry: &InstrumentRegistry,
    format: QuoteFileFormat,
) -> Result<Vec<QuoteEvent>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::config(format!("cannot open dataset {}: {e}", path.display())))?;
    let quotes = parse_quotes(file, &path.display().to_string(), registry, format)?;
    debug!(path = %path.display(), rows = quotes.len(), "loaded dataset");
    Ok(quotes)
}

/// Parse quote rows from `reader`. `source` names the input in error messages.
pub fn parse_quotes<R: Read>(
    reader: R,
    source: &str,
    registry: &InstrumentRegistry,
    format: QuoteFileFormat,
) -> Result<Vec<QuoteEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut quotes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != QUOTE_FIELDS {
            return Err(Error::data(format!(
                "{source}:{line}: expected {QUOTE_FIELDS} fields, found {}",
                record.len()
            )));
        }

        let security_id = &record[1];
        if security_id.is_empty() {
            return Err(Error::data(format!("{source}:{line}: empty security id")));
        }

        quotes.push(QuoteEvent {
            timestamp: parse_field(&record[0], "timestamp", source, line)?,
            instrument: registry.get_or_create(security_id),
            bid_size: parse_field(&record[3], "bid size", source, line)?,
            bid_price: parse_field(&record[4], "bid price", source, line)?,
            ask_price: parse_field(&record[5], "ask price", source, line)?,
            ask_size: parse_field(&record[6], "ask size", source, line)?,
        });
    }
    Ok(quotes)
}

fn parse_field<T: FromStr>(raw: &str, name: &str, source: &str, line: u64) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::data(format!("{source}:{line}: invalid {name} {raw:?}")))
}
