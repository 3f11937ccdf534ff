//! Order-level trade history.
//!
//! Each executed trade contributes one row per asset leg. Trade-level fields
//! (bars, thresholds) repeat across a trade's rows; per-leg fields (asset,
//! lot, pnl) are exploded.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use crate::domain::trade::Trade;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_id: usize,
    pub trade_id: usize,
    pub asset: String,
    pub lot: f64,
    pub open_bar: Bar,
    pub close_bar: Bar,
    pub shut_bar: Bar,
    pub take: Option<f64>,
    pub stop: Option<f64>,
    pub pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<OrderRecord>,
}

impl History {
    /// Flatten executed trades, numbering trades in the order given.
    pub fn from_trades(trades: &[Trade]) -> Result<Self, TradeflowError> {
        let n_orders = trades.iter().map(Trade::n_orders).sum();
        let mut records = Vec::with_capacity(n_orders);

        for (trade_id, trade) in trades.iter().enumerate() {
            let execution = trade.execution()?;
            for ((asset, &lot), &pnl) in trade
                .asset()
                .iter()
                .zip(trade.lot())
                .zip(&execution.pnl)
            {
                records.push(OrderRecord {
                    order_id: records.len(),
                    trade_id,
                    asset: asset.clone(),
                    lot,
                    open_bar: execution.open_bar.clone(),
                    close_bar: execution.close_bar.clone(),
                    shut_bar: execution.shut_bar.clone(),
                    take: trade.take(),
                    stop: trade.stop(),
                    pnl,
                });
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn n_orders(&self) -> usize {
        self.records.len()
    }

    pub fn n_trades(&self) -> usize {
        self.records.last().map_or(0, |r| r.trade_id + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn order_ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.order_id).collect()
    }

    pub fn trade_ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.trade_id).collect()
    }

    pub fn assets(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.asset.as_str()).collect()
    }

    pub fn lots(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.lot).collect()
    }

    pub fn open_bars(&self) -> Vec<&Bar> {
        self.records.iter().map(|r| &r.open_bar).collect()
    }

    pub fn close_bars(&self) -> Vec<&Bar> {
        self.records.iter().map(|r| &r.close_bar).collect()
    }

    pub fn shut_bars(&self) -> Vec<&Bar> {
        self.records.iter().map(|r| &r.shut_bar).collect()
    }

    pub fn pnls(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.pnl).collect()
    }

    /// Profit/loss summed per trade, indexed by `trade_id`.
    pub fn trade_pnls(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_trades()];
        for record in &self.records {
            totals[record.trade_id] += record.pnl;
        }
        totals
    }

    /// Bars held per order, counted in panel positions.
    pub fn durations(&self, panel: &PricePanel) -> Result<Vec<usize>, TradeflowError> {
        self.records
            .iter()
            .map(|r| -> Result<usize, TradeflowError> {
                Ok(panel.require_bar(&r.close_bar)? - panel.require_bar(&r.open_bar)?)
            })
            .collect()
    }

    pub fn open_prices(&self, panel: &PricePanel) -> Result<Vec<f64>, TradeflowError> {
        self.prices_at(panel, |r| &r.open_bar)
    }

    pub fn close_prices(&self, panel: &PricePanel) -> Result<Vec<f64>, TradeflowError> {
        self.prices_at(panel, |r| &r.close_bar)
    }

    /// `(close_price - open_price) * lot` per order.
    pub fn gains(&self, panel: &PricePanel) -> Result<Vec<f64>, TradeflowError> {
        let open = self.open_prices(panel)?;
        let close = self.close_prices(panel)?;
        Ok(self
            .records
            .iter()
            .zip(open.iter().zip(&close))
            .map(|(r, (o, c))| (c - o) * r.lot)
            .collect())
    }

    fn prices_at<F>(&self, panel: &PricePanel, bar_of: F) -> Result<Vec<f64>, TradeflowError>
    where
        F: Fn(&OrderRecord) -> &Bar,
    {
        let mut bar_ids = Vec::with_capacity(self.records.len());
        let mut asset_ids = Vec::with_capacity(self.records.len());
        for record in &self.records {
            bar_ids.push(panel.require_bar(bar_of(record))?);
            asset_ids.push(panel.require_asset(&record.asset)?);
        }
        Ok(panel.prices_at(&bar_ids, &asset_ids))
    }
}
