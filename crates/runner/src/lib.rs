//! Wiring for the `arbsim` binary: load a run configuration, replay the
//! market data through the arbitrage strategy and report the outcome.

pub mod logging;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use arbsim_backtest::{write_trade_report, RunMetrics, Simulation};
use arbsim_core::{Config, InstrumentRegistry, Order};
use arbsim_strategy::{ArbitrageStrategy, StrategyHost, HOST_KINDS};
use tracing::info;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Quotes replayed.
    pub quotes: u64,
    /// Orders still queued at the matcher when the data ran out.
    pub pending_orders: usize,
    /// Whether the stop-loss fired during the run.
    pub stopped_out: bool,
    /// Filled orders, in fill order.
    pub trades: Vec<Rc<Order>>,
    /// Summary of the strategy's trading.
    pub metrics: RunMetrics,
}

/// Load the configuration at `path` and run it.
///
/// `report` overrides the report path from the configuration.
pub fn run_from_file(path: &Path, report: Option<PathBuf>) -> Result<RunOutcome> {
    let mut config = Config::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if report.is_some() {
        config.report = report;
    }
    run(&config)
}

/// Run the arbitrage strategy over the configured datasets.
pub fn run(config: &Config) -> Result<RunOutcome> {
    config.validate().context("invalid configuration")?;
    info!(
        entry_spread = config.strategy.entry_spread,
        max_position = config.strategy.max_position,
        stop_loss = config.strategy.stop_loss,
        datasets = config.data_files.len(),
        "starting arbitrage run"
    );

    let registry = Rc::new(InstrumentRegistry::new());
    let mut sim = Simulation::from_config(config, &registry).context("failed to load market data")?;

    let host = Rc::new(RefCell::new(StrategyHost::new(
        ArbitrageStrategy::new(config.strategy),
        Rc::clone(&registry),
    )));
    sim.subscribe(Rc::clone(&host), &HOST_KINDS);

    let quotes = sim.run().context("simulation failed")?;
    let pending_orders = sim.matcher().total_pending();

    let host = host.borrow();
    let trades = host.ledger().trades().to_vec();
    let metrics = RunMetrics::from_ledger(host.ledger());

    if let Some(path) = &config.report {
        write_trade_report(path, &trades)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    info!(
        quotes,
        trades = metrics.total_trades,
        stop_loss_trades = metrics.stop_loss_trades,
        full_pnl = metrics.full_pnl,
        "arbitrage run finished"
    );

    Ok(RunOutcome {
        quotes,
        pending_orders,
        stopped_out: host.policy().is_trading_restricted(),
        trades,
        metrics,
    })
}
