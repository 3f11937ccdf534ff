//! Price panel: an immutable bar × asset price table.
//!
//! Lookups by name never fail loudly. A name missing from either axis
//! resolves to [`NOT_FOUND`] so that batch lookups over many names do not
//! abort on a partial miss; callers check the sentinel.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, s};
use std::collections::HashMap;

/// Sentinel index for a bar or asset name absent from the panel.
pub const NOT_FOUND: isize = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    name: Option<String>,
    bars: Vec<Bar>,
    assets: Vec<String>,
    prices: Array2<f64>,
    bar_lookup: HashMap<Bar, usize>,
    asset_lookup: HashMap<String, usize>,
}

impl PricePanel {
    /// Build a panel from a dense `(n_bars, n_assets)` price table.
    ///
    /// Rejects shape mismatches, NaN or infinite prices, and duplicate names
    /// on either axis. The error names the offending axis.
    pub fn new(
        bars: Vec<Bar>,
        assets: Vec<String>,
        prices: Array2<f64>,
    ) -> Result<Self, TradeflowError> {
        if prices.nrows() != bars.len() || prices.ncols() != assets.len() {
            return Err(invalid(
                "prices",
                format!(
                    "shape ({}, {}) does not match {} bars x {} assets",
                    prices.nrows(),
                    prices.ncols(),
                    bars.len(),
                    assets.len()
                ),
            ));
        }
        if let Some(((t, i), value)) = prices.indexed_iter().find(|(_, v)| !v.is_finite()) {
            let kind = if value.is_nan() { "NaN" } else { "infinite" };
            return Err(invalid(
                "prices",
                format!("{kind} price at bar {} asset {}", bars[t], assets[i]),
            ));
        }

        let mut bar_lookup = HashMap::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            if bar_lookup.insert(bar.clone(), i).is_some() {
                return Err(invalid("bars", format!("duplicate bar {bar}")));
            }
        }
        let mut asset_lookup = HashMap::with_capacity(assets.len());
        for (i, asset) in assets.iter().enumerate() {
            if asset_lookup.insert(asset.clone(), i).is_some() {
                return Err(invalid("assets", format!("duplicate asset {asset}")));
            }
        }

        Ok(Self {
            name: None,
            bars,
            assets,
            prices,
            bar_lookup,
            asset_lookup,
        })
    }

    /// Build a panel from row-major price rows, one row per bar.
    pub fn from_rows(
        bars: Vec<Bar>,
        assets: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TradeflowError> {
        let n_assets = assets.len();
        if let Some((t, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_assets) {
            return Err(invalid(
                "prices",
                format!("row {t} has {} values, expected {n_assets}", row.len()),
            ));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let prices = Array2::from_shape_vec((flat.len() / n_assets.max(1), n_assets), flat)
            .map_err(|e| invalid("prices", e.to_string()))?;
        Self::new(bars, assets, prices)
    }

    /// Build a panel with integer bars `0..n` from named price columns.
    pub fn from_columns(columns: &[(&str, Vec<f64>)]) -> Result<Self, TradeflowError> {
        let n_bars = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != n_bars) {
            return Err(invalid(
                "prices",
                format!("column {name} has {} values, expected {n_bars}", col.len()),
            ));
        }
        let mut prices = Array2::zeros((n_bars, columns.len()));
        for (i, (_, col)) in columns.iter().enumerate() {
            for (t, &p) in col.iter().enumerate() {
                prices[[t, i]] = p;
            }
        }
        let bars = (0..n_bars as i64).map(Bar::Index).collect();
        let assets = columns.iter().map(|(name, _)| name.to_string()).collect();
        Self::new(bars, assets, prices)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn prices(&self) -> ArrayView2<'_, f64> {
        self.prices.view()
    }

    pub fn n_bars(&self) -> usize {
        self.bars.len()
    }

    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn first_bar(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last_bar(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn bar_index(&self, bar: &Bar) -> isize {
        self.bar_lookup
            .get(bar)
            .map(|&i| i as isize)
            .unwrap_or(NOT_FOUND)
    }

    pub fn bar_indexer(&self, bars: &[Bar]) -> Vec<isize> {
        bars.iter().map(|b| self.bar_index(b)).collect()
    }

    pub fn asset_index(&self, asset: &str) -> isize {
        self.asset_lookup
            .get(asset)
            .map(|&i| i as isize)
            .unwrap_or(NOT_FOUND)
    }

    pub fn asset_indexer<S: AsRef<str>>(&self, assets: &[S]) -> Vec<isize> {
        assets.iter().map(|a| self.asset_index(a.as_ref())).collect()
    }

    /// Resolve a bar that must exist.
    pub fn require_bar(&self, bar: &Bar) -> Result<usize, TradeflowError> {
        self.bar_lookup
            .get(bar)
            .copied()
            .ok_or_else(|| TradeflowError::UnknownBar(bar.to_string()))
    }

    /// Resolve an asset that must exist.
    pub fn require_asset(&self, asset: &str) -> Result<usize, TradeflowError> {
        self.asset_lookup
            .get(asset)
            .copied()
            .ok_or_else(|| TradeflowError::UnknownAsset(asset.to_string()))
    }

    pub fn price_at(&self, bar_index: usize, asset_index: usize) -> f64 {
        self.prices[[bar_index, asset_index]]
    }

    /// Prices picked at parallel `(bar, asset)` index pairs.
    pub fn prices_at(&self, bar_indices: &[usize], asset_indices: &[usize]) -> Vec<f64> {
        bar_indices
            .iter()
            .zip(asset_indices)
            .map(|(&t, &i)| self.prices[[t, i]])
            .collect()
    }

    pub fn asset_prices(&self, asset_index: usize) -> ArrayView1<'_, f64> {
        self.prices.column(asset_index)
    }

    /// One-hot rows over the bar axis, shape `(indices.len(), n_bars)`.
    pub fn bar_onehot(&self, bar_indices: &[usize]) -> Array2<f64> {
        onehot(bar_indices, self.n_bars())
    }

    /// One-hot rows over the asset axis, shape `(indices.len(), n_assets)`.
    pub fn asset_onehot(&self, asset_indices: &[usize]) -> Array2<f64> {
        onehot(asset_indices, self.n_assets())
    }

    /// Sub-panel between two bars, both inclusive.
    pub fn slice(&self, begin: &Bar, end: &Bar) -> Result<PricePanel, TradeflowError> {
        let b = self.require_bar(begin)?;
        let e = self.require_bar(end)?;
        if b > e {
            return Err(invalid("bars", format!("begin {begin} is after end {end}")));
        }
        let mut panel = PricePanel::new(
            self.bars[b..=e].to_vec(),
            self.assets.clone(),
            self.prices.slice(s![b..=e, ..]).to_owned(),
        )?;
        panel.name = self.name.clone();
        Ok(panel)
    }

    /// First-row prices, used to size value-weighted positions.
    pub fn first_prices(&self) -> Option<ArrayView1<'_, f64>> {
        (self.n_bars() > 0).then(|| self.prices.index_axis(Axis(0), 0))
    }
}

fn onehot(indices: &[usize], width: usize) -> Array2<f64> {
    let mut out = Array2::zeros((indices.len(), width));
    for (row, &i) in indices.iter().enumerate() {
        out[[row, i]] = 1.0;
    }
    out
}

fn invalid(axis: &str, reason: String) -> TradeflowError {
    TradeflowError::InvalidPanel {
        axis: axis.to_string(),
        reason,
    }
}
