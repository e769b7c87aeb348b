//! Trade report output.
//!
//! One semicolon-delimited row per filled order, in fill order:
//!
//! ```text
//! SecurityId;SentTimestamp;ExecutedTimestamp;ExecPrice;Qty;Side;Type
//! FutureA;1544166008681726608;1544166008721726608;10927;1;SELL;Market
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use arbsim_core::{Order, Result};
use tracing::info;

/// Report column names.
pub const REPORT_HEADER: [&str; 7] = [
    "SecurityId",
    "SentTimestamp",
    "ExecutedTimestamp",
    "ExecPrice",
    "Qty",
    "Side",
    "Type",
];

/// Write the report for `trades` to `writer`.
pub fn write_trades<W: Write>(writer: W, trades: &[Rc<Order>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    writer.write_record(REPORT_HEADER)?;
    for order in trades {
        writer.write_record([
            order.security_id().to_string(),
            order.sent_timestamp.to_string(),
            order.executed_timestamp.to_string(),
            order.exec_price.to_string(),
            order.qty.to_string(),
            order.side.to_string(),
            order.order_type.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the report for `trades` to the file at `path`.
pub fn write_trade_report(path: impl AsRef<Path>, trades: &[Rc<Order>]) -> Result<()> {
    let path = path.as_ref();
    write_trades(File::create(path)?, trades)?;
    info!(path = %path.display(), trades = trades.len(), "trade report written");
    Ok(())
}
