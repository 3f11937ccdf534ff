//! Trades and their execution against a price panel.
//!
//! A [`Trade`] is a bundle of asset legs opened together at one bar and
//! closed together either at its shut bar (the panel's last bar when unset)
//! or earlier, when its running profit/loss crosses the take-profit or
//! stop-loss threshold.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use crate::domain::signal::{catch_first, cross_down, cross_up, true_at};
use ndarray::{Array1, Array2, Axis, s};
use std::ops::{Div, Mul, Neg};

/// Result of executing a trade: resolved bars and per-leg profit/loss.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub open_bar: Bar,
    pub shut_bar: Bar,
    pub close_bar: Bar,
    pub pnl: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    asset: Vec<String>,
    lot: Vec<f64>,
    open_bar: Option<Bar>,
    shut_bar: Option<Bar>,
    take: Option<f64>,
    stop: Option<f64>,
    execution: Option<Execution>,
}

/// Panel positions a trade is active over.
#[derive(Debug, Clone)]
struct Window {
    assets: Vec<usize>,
    open: usize,
    timeout: usize,
}

impl Trade {
    /// Create a trade from parallel asset and lot sequences.
    ///
    /// The trade opens at the panel's first bar and shuts at its last bar
    /// unless [`Trade::open_at`] / [`Trade::shut_at`] say otherwise.
    pub fn new<A, S, L>(asset: A, lot: L) -> Result<Self, TradeflowError>
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
        L: IntoIterator<Item = f64>,
    {
        let asset: Vec<String> = asset.into_iter().map(Into::into).collect();
        let lot: Vec<f64> = lot.into_iter().collect();
        if asset.is_empty() {
            return Err(invalid("a trade needs at least one asset".into()));
        }
        if asset.len() != lot.len() {
            return Err(invalid(format!(
                "{} assets but {} lots",
                asset.len(),
                lot.len()
            )));
        }
        check_lots(&lot)?;
        Ok(Self {
            asset,
            lot,
            open_bar: None,
            shut_bar: None,
            take: None,
            stop: None,
            execution: None,
        })
    }

    /// Single-leg trade.
    pub fn single(asset: impl Into<String>, lot: f64) -> Result<Self, TradeflowError> {
        Self::new([asset.into()], [lot])
    }

    pub fn open_at(mut self, bar: impl Into<Bar>) -> Self {
        self.open_bar = Some(bar.into());
        self.execution = None;
        self
    }

    pub fn shut_at(mut self, bar: impl Into<Bar>) -> Self {
        self.shut_bar = Some(bar.into());
        self.execution = None;
        self
    }

    /// Close once the running profit rises above `take`.
    pub fn take_profit(mut self, take: f64) -> Result<Self, TradeflowError> {
        if !take.is_finite() || take < 0.0 {
            return Err(invalid(format!("take {take} must be finite and >= 0")));
        }
        self.take = Some(take);
        self.execution = None;
        Ok(self)
    }

    /// Close once the running profit falls below `stop`.
    pub fn stop_loss(mut self, stop: f64) -> Result<Self, TradeflowError> {
        if !stop.is_finite() || stop > 0.0 {
            return Err(invalid(format!("stop {stop} must be finite and <= 0")));
        }
        self.stop = Some(stop);
        self.execution = None;
        Ok(self)
    }

    pub fn asset(&self) -> &[String] {
        &self.asset
    }

    pub fn lot(&self) -> &[f64] {
        &self.lot
    }

    pub fn open_bar(&self) -> Option<&Bar> {
        self.open_bar.as_ref()
    }

    pub fn shut_bar(&self) -> Option<&Bar> {
        self.shut_bar.as_ref()
    }

    pub fn take(&self) -> Option<f64> {
        self.take
    }

    pub fn stop(&self) -> Option<f64> {
        self.stop
    }

    /// Number of asset legs (orders).
    pub fn n_orders(&self) -> usize {
        self.asset.len()
    }

    pub fn is_executed(&self) -> bool {
        self.execution.is_some()
    }

    pub fn execution(&self) -> Result<&Execution, TradeflowError> {
        self.execution.as_ref().ok_or(TradeflowError::NotExecuted)
    }

    pub fn close_bar(&self) -> Result<&Bar, TradeflowError> {
        self.execution().map(|e| &e.close_bar)
    }

    /// Realized profit/loss of each leg.
    pub fn pnl(&self) -> Result<&[f64], TradeflowError> {
        self.execution().map(|e| e.pnl.as_slice())
    }

    /// Realized profit/loss summed over legs.
    pub fn final_pnl(&self) -> Result<f64, TradeflowError> {
        self.pnl().map(|p| p.iter().sum())
    }

    /// Resolve the close bar and per-leg profit/loss against `panel`.
    ///
    /// Executing again recomputes from scratch.
    pub fn execute(&mut self, panel: &PricePanel) -> Result<&mut Self, TradeflowError> {
        let window = self.window(panel)?;
        let value = self.value_matrix(panel, &window.assets);
        let close = self.resolve_close(&value, &window)?;

        let pnl = (0..self.n_orders())
            .map(|i| value[[close, i]] - value[[window.open, i]])
            .collect();

        let bars = panel.bars();
        self.execution = Some(Execution {
            open_bar: bars[window.open].clone(),
            shut_bar: bars[window.timeout].clone(),
            close_bar: bars[close].clone(),
            pnl,
        });
        Ok(self)
    }

    /// Position value of each leg, zero outside the active window.
    ///
    /// Shape `(n_bars, n_orders)`. The window ends at the close bar once
    /// executed, at the shut bar before.
    pub fn array_exposure(&self, panel: &PricePanel) -> Result<Array2<f64>, TradeflowError> {
        let window = self.active_window(panel)?;
        let mut exposure = self.value_matrix(panel, &window.assets);
        exposure.slice_mut(s![..window.open, ..]).fill(0.0);
        exposure.slice_mut(s![window.timeout + 1.., ..]).fill(0.0);
        Ok(exposure)
    }

    /// Net (signed) or absolute exposure summed over legs.
    pub fn series_exposure(
        &self,
        panel: &PricePanel,
        net: bool,
    ) -> Result<Array1<f64>, TradeflowError> {
        let exposure = self.array_exposure(panel)?;
        Ok(if net {
            exposure.sum_axis(Axis(1))
        } else {
            exposure.mapv(f64::abs).sum_axis(Axis(1))
        })
    }

    /// Running profit/loss of each leg relative to the open bar.
    ///
    /// Zero before the open bar and frozen after the window ends.
    pub fn array_pnl(&self, panel: &PricePanel) -> Result<Array2<f64>, TradeflowError> {
        let window = self.active_window(panel)?;
        let value = self.value_matrix(panel, &window.assets);
        Ok(running_pnl(&value, window.open, window.timeout))
    }

    pub fn series_pnl(&self, panel: &PricePanel) -> Result<Array1<f64>, TradeflowError> {
        Ok(self.array_pnl(panel)?.sum_axis(Axis(1)))
    }

    fn window(&self, panel: &PricePanel) -> Result<Window, TradeflowError> {
        // Scaling can leave non-finite lots behind.
        check_lots(&self.lot)?;
        let open_bar = match (&self.open_bar, panel.first_bar()) {
            (Some(bar), _) | (None, Some(bar)) => bar,
            (None, None) => return Err(invalid("panel has no bars".into())),
        };
        let shut_bar = match (&self.shut_bar, panel.last_bar()) {
            (Some(bar), _) | (None, Some(bar)) => bar,
            (None, None) => return Err(invalid("panel has no bars".into())),
        };
        let open = panel.require_bar(open_bar)?;
        let timeout = panel.require_bar(shut_bar)?;
        if timeout < open {
            return Err(invalid(format!(
                "shut bar {shut_bar} precedes open bar {open_bar}"
            )));
        }
        let assets = self
            .asset
            .iter()
            .map(|a| panel.require_asset(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Window {
            assets,
            open,
            timeout,
        })
    }

    fn active_window(&self, panel: &PricePanel) -> Result<Window, TradeflowError> {
        let mut window = self.window(panel)?;
        if let Some(execution) = &self.execution {
            window.timeout = panel.require_bar(&execution.close_bar)?;
        }
        Ok(window)
    }

    fn value_matrix(&self, panel: &PricePanel, assets: &[usize]) -> Array2<f64> {
        Array2::from_shape_fn((panel.n_bars(), assets.len()), |(t, i)| {
            self.lot[i] * panel.price_at(t, assets[i])
        })
    }

    fn resolve_close(&self, value: &Array2<f64>, window: &Window) -> Result<usize, TradeflowError> {
        if self.take.is_none() && self.stop.is_none() {
            return Ok(window.timeout);
        }

        let n_bars = value.nrows();
        let pnl = running_pnl(value, window.open, window.timeout)
            .sum_axis(Axis(1))
            .insert_axis(Axis(1));

        let mut signals = vec![true_at(&[window.timeout], n_bars)];
        if let Some(take) = self.take {
            signals.push(cross_up(pnl.view(), &[take]));
        }
        if let Some(stop) = self.stop {
            signals.push(cross_down(pnl.view(), &[stop]));
        }
        let views: Vec<_> = signals.iter().map(|s| s.view()).collect();
        let first = catch_first(&views)?;

        Ok(first
            .first()
            .copied()
            .flatten()
            .map_or(window.timeout, |bar| bar.min(window.timeout)))
    }

    fn scaled(mut self, factor: f64) -> Self {
        for lot in &mut self.lot {
            *lot *= factor;
        }
        self.execution = None;
        self
    }
}

/// `value - value[open]` over `open..=end`, zero before, frozen after.
fn running_pnl(value: &Array2<f64>, open: usize, end: usize) -> Array2<f64> {
    let mut pnl = value.clone();
    let base = value.row(open).to_owned();
    for mut row in pnl.rows_mut() {
        row -= &base;
    }
    pnl.slice_mut(s![..open, ..]).fill(0.0);
    let last = pnl.row(end).to_owned();
    for mut row in pnl.slice_mut(s![end + 1.., ..]).rows_mut() {
        row.assign(&last);
    }
    pnl
}

fn check_lots(lot: &[f64]) -> Result<(), TradeflowError> {
    match lot.iter().find(|l| !l.is_finite()) {
        Some(l) => Err(invalid(format!("lot {l} is not finite"))),
        None => Ok(()),
    }
}

fn invalid(reason: String) -> TradeflowError {
    TradeflowError::InvalidTrade { reason }
}

impl Mul<f64> for Trade {
    type Output = Trade;

    fn mul(self, rhs: f64) -> Trade {
        self.scaled(rhs)
    }
}

impl Mul<Trade> for f64 {
    type Output = Trade;

    fn mul(self, rhs: Trade) -> Trade {
        rhs.scaled(self)
    }
}

impl Div<f64> for Trade {
    type Output = Trade;

    fn div(self, rhs: f64) -> Trade {
        self.scaled(1.0 / rhs)
    }
}

impl Neg for Trade {
    type Output = Trade;

    fn neg(self) -> Trade {
        self.scaled(-1.0)
    }
}
