//! Bar × asset transaction ledger.
//!
//! Every order adds `+lot` to its asset at the open bar and `-lot` at the
//! close bar. The ledger is built as one matrix product
//!
//! ```text
//! T = (OneHotOpenᵀ - OneHotCloseᵀ) · diag(lot) · OneHotAsset
//!     (bars × orders)  (orders × orders)  (orders × assets)
//! ```
//!
//! so coinciding orders accumulate without looping over bars or assets.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::history::History;
use crate::domain::panel::PricePanel;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    bars: Vec<Bar>,
    assets: Vec<String>,
    matrix: Array2<f64>,
}

/// One non-zero ledger cell, for row-oriented export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub bar: Bar,
    pub asset: String,
    pub quantity: f64,
}

impl Transaction {
    pub fn from_history(history: &History, panel: &PricePanel) -> Result<Self, TradeflowError> {
        let shape = (panel.n_bars(), panel.n_assets());
        let matrix = if history.is_empty() {
            Array2::zeros(shape)
        } else {
            let mut open_ids = Vec::with_capacity(history.n_orders());
            let mut close_ids = Vec::with_capacity(history.n_orders());
            let mut asset_ids = Vec::with_capacity(history.n_orders());
            for record in history.records() {
                open_ids.push(panel.require_bar(&record.open_bar)?);
                close_ids.push(panel.require_bar(&record.close_bar)?);
                asset_ids.push(panel.require_asset(&record.asset)?);
            }

            let events = (panel.bar_onehot(&open_ids) - panel.bar_onehot(&close_ids)).reversed_axes();
            let lots = Array2::from_diag(&ndarray::Array1::from(history.lots()));
            events.dot(&lots).dot(&panel.asset_onehot(&asset_ids))
        };

        Ok(Self {
            bars: panel.bars().to_vec(),
            assets: panel.assets().to_vec(),
            matrix,
        })
    }

    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Quantity changes of one asset over all bars.
    pub fn column(&self, asset: &str) -> Option<ArrayView1<'_, f64>> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.matrix.column(i))
    }

    /// Holdings after each bar's transactions.
    pub fn positions(&self) -> Array2<f64> {
        let mut positions = self.matrix.clone();
        positions.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
        positions
    }

    /// Non-zero cells, bar-major.
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.matrix
            .indexed_iter()
            .filter(|(_, q)| **q != 0.0)
            .map(|((t, i), &quantity)| TransactionRecord {
                bar: self.bars[t].clone(),
                asset: self.assets[i].clone(),
                quantity,
            })
            .collect()
    }
}
