#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tradeflow::domain::backtest::BacktestResult;
use tradeflow::domain::error::TradeflowError;
use tradeflow::domain::panel::PricePanel;
use tradeflow::domain::trade::Trade;
use tradeflow::ports::panel_port::PanelPort;
use tradeflow::ports::report_port::ReportPort;

/// A0 = digits of pi, A1 = digits of e.
pub fn hand_panel() -> PricePanel {
    PricePanel::from_columns(&[
        ("A0", vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]),
        ("A1", vec![2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0]),
    ])
    .unwrap()
}

/// One asset rising linearly from 100 to 200 over `n_bars` bars.
pub fn linear_panel(n_bars: usize) -> PricePanel {
    let step = 100.0 / (n_bars - 1) as f64;
    let prices = (0..n_bars).map(|t| 100.0 + step * t as f64).collect();
    PricePanel::from_columns(&[("A0", prices)]).unwrap()
}

pub fn execute_all(mut trades: Vec<Trade>, panel: &PricePanel) -> Vec<Trade> {
    for trade in &mut trades {
        trade.execute(panel).unwrap();
    }
    trades
}

pub struct MockPanelPort {
    pub panel: Option<PricePanel>,
}

impl MockPanelPort {
    pub fn new(panel: PricePanel) -> Self {
        Self { panel: Some(panel) }
    }

    pub fn failing() -> Self {
        Self { panel: None }
    }
}

impl PanelPort for MockPanelPort {
    fn load_panel(&self) -> Result<PricePanel, TradeflowError> {
        self.panel.clone().ok_or_else(|| TradeflowError::Data {
            reason: "mock panel unavailable".into(),
        })
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(BacktestResult, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TradeflowError> {
        self.calls
            .borrow_mut()
            .push((result.clone(), output_dir.to_path_buf()));
        Ok(())
    }
}

pub fn assert_all_close<'a, I, J>(got: I, want: J, tol: f64)
where
    I: IntoIterator<Item = &'a f64>,
    J: IntoIterator<Item = &'a f64>,
{
    let got: Vec<f64> = got.into_iter().copied().collect();
    let want: Vec<f64> = want.into_iter().copied().collect();
    assert_eq!(got.len(), want.len(), "{got:?} vs {want:?}");
    for (g, w) in got.iter().zip(&want) {
        assert!((g - w).abs() < tol, "{got:?} vs {want:?}");
    }
}
