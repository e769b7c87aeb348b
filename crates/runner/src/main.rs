//! `arbsim` binary.
//!
//! Runs the two-leg arbitrage backtest described by a JSON configuration and
//! prints the resulting PnL.

use std::path::PathBuf;

use clap::Parser;

/// Latency-aware arbitrage backtester
#[derive(Parser, Debug)]
#[command(name = "arbsim", about = "Two-leg arbitrage backtester")]
struct Args {
    /// Path to the JSON run configuration.
    #[arg(short, long)]
    config: PathBuf,

    /// Write the trade report here, overriding the configuration.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    arbsim_runner::logging::init_tracing(args.json_logs);

    let outcome = arbsim_runner::run_from_file(&args.config, args.report)?;

    let metrics = &outcome.metrics;
    println!("Quotes replayed: {}", outcome.quotes);
    println!(
        "Trades: {} ({} buy, {} sell, {} stop-loss)",
        metrics.total_trades, metrics.buy_trades, metrics.sell_trades, metrics.stop_loss_trades
    );
    println!("Traded notional: {}", metrics.traded_notional);
    println!("Average fill delay: {}", metrics.avg_fill_delay);
    if outcome.pending_orders > 0 {
        println!("Unfilled orders: {}", outcome.pending_orders);
    }
    for (security_id, pnl) in &metrics.pnl_by_instrument {
        println!("PnL {security_id}: {pnl}");
    }
    println!("Full PnL: {}", metrics.full_pnl);
    Ok(())
}
