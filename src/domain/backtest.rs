//! Backtest runner.
//!
//! A run is generate → execute → aggregate: the strategy emits trades,
//! each trade is executed against the panel, and the executed trades are
//! folded into history, transaction and wealth.

use crate::domain::error::TradeflowError;
use crate::domain::history::History;
use crate::domain::metrics::Metrics;
use crate::domain::observer::{ProgressEvent, ProgressObserver};
use crate::domain::panel::PricePanel;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::domain::transaction::Transaction;
use crate::domain::wealth::Wealth;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Starting cash added to the wealth curve by metrics.
    pub budget: f64,
    /// Accept a strategy that yields no trades.
    pub allow_empty: bool,
    /// Per-bar risk-free return used by the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            budget: 0.0,
            allow_empty: false,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: String,
    pub trades: Vec<Trade>,
    pub history: History,
    pub transaction: Transaction,
    pub wealth: Wealth,
    pub config: BacktestConfig,
}

impl BacktestResult {
    pub fn metrics(&self, panel: &PricePanel) -> Result<Metrics, TradeflowError> {
        Metrics::compute(
            &self.history,
            &self.wealth,
            panel,
            self.config.budget,
            self.config.risk_free_rate,
        )
    }
}

pub fn run_backtest<S, O>(
    strategy: &S,
    panel: &PricePanel,
    config: &BacktestConfig,
    observer: &mut O,
) -> Result<BacktestResult, TradeflowError>
where
    S: Strategy + ?Sized,
    O: ProgressObserver + ?Sized,
{
    let name = strategy.name();
    observer.on_event(&ProgressEvent::GenerationStarted {
        strategy: name.clone(),
    });
    let mut trades = strategy.logic(panel);
    observer.on_event(&ProgressEvent::GenerationFinished {
        n_trades: trades.len(),
    });

    if trades.is_empty() && !config.allow_empty {
        return Err(TradeflowError::NoTrades);
    }

    observer.on_event(&ProgressEvent::ExecutionStarted {
        n_trades: trades.len(),
    });
    for trade in &mut trades {
        trade.execute(panel)?;
    }
    observer.on_event(&ProgressEvent::ExecutionFinished {
        n_trades: trades.len(),
    });

    let history = History::from_trades(&trades)?;
    observer.on_event(&ProgressEvent::AggregationStarted {
        n_orders: history.n_orders(),
    });
    let transaction = Transaction::from_history(&history, panel)?;
    let wealth = Wealth::from_transaction(&transaction, panel)?;
    observer.on_event(&ProgressEvent::AggregationFinished {
        final_wealth: wealth.final_value(),
    });

    Ok(BacktestResult {
        strategy: name,
        trades,
        history,
        transaction,
        wealth,
        config: config.clone(),
    })
}
