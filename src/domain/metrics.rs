//! Performance metrics over the wealth curve and trade history.
//!
//! Series functions take the wealth curve with the budget already added
//! (see [`with_budget`]). `rate = true` switches from absolute changes to
//! relative ones.

use crate::domain::error::TradeflowError;
use crate::domain::history::History;
use crate::domain::panel::PricePanel;
use crate::domain::trade::Trade;
use crate::domain::wealth::Wealth;
use ndarray::{Array1, ArrayView1, s};

/// Floor for a standard deviation used as a divisor.
pub const EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_wealth: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_rate: f64,
    pub max_drawdown_duration: usize,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub tradewise_sharpe_ratio: f64,
    pub n_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    /// Summarise a run.
    ///
    /// With a positive budget, volatility and Sharpe ratio are computed on
    /// per-bar return rates and `risk_free_rate` is subtracted per bar.
    /// With a zero budget they use absolute per-bar P&L and the risk-free
    /// rate is ignored.
    pub fn compute(
        history: &History,
        wealth: &Wealth,
        panel: &PricePanel,
        budget: f64,
        risk_free_rate: f64,
    ) -> Result<Self, TradeflowError> {
        let series = with_budget(wealth, budget);
        let rate = budget > 0.0;

        let final_wealth = series.last().copied().unwrap_or(budget);
        let total_return = if rate {
            (final_wealth - budget) / budget
        } else {
            0.0
        };

        let risk_free = if rate { risk_free_rate } else { 0.0 };
        let trade_pnls = history.trade_pnls();
        let durations = trade_durations(history, panel)?;

        let mut metrics = Metrics {
            final_wealth,
            total_return,
            max_drawdown: max_drawdown(series.view(), false),
            max_drawdown_rate: max_drawdown(series.view(), true),
            max_drawdown_duration: max_drawdown_duration(series.view()),
            volatility: volatility(series.view(), rate),
            sharpe_ratio: sharpe_ratio(series.view(), rate, risk_free),
            tradewise_sharpe_ratio: tradewise_sharpe_ratio(&trade_pnls),
            n_trades: trade_pnls.len(),
            trades_won: 0,
            trades_lost: 0,
            trades_breakeven: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            avg_trade_duration: 0.0,
        };
        metrics.fill_trade_stats(&trade_pnls, &durations);
        Ok(metrics)
    }

    fn fill_trade_stats(&mut self, trade_pnls: &[f64], durations: &[usize]) {
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;

        for &pnl in trade_pnls {
            if pnl > 0.0 {
                self.trades_won += 1;
                total_wins += pnl;
                self.largest_win = self.largest_win.max(pnl);
            } else if pnl < 0.0 {
                self.trades_lost += 1;
                total_losses += pnl.abs();
                self.largest_loss = self.largest_loss.max(pnl.abs());
            } else {
                self.trades_breakeven += 1;
            }
        }

        let total_trades = trade_pnls.len();
        if total_trades > 0 {
            self.win_rate = self.trades_won as f64 / total_trades as f64;
            self.avg_trade_duration =
                durations.iter().sum::<usize>() as f64 / durations.len().max(1) as f64;
        }
        self.profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        if self.trades_won > 0 {
            self.avg_win = total_wins / self.trades_won as f64;
        }
        if self.trades_lost > 0 {
            self.avg_loss = total_losses / self.trades_lost as f64;
        }
    }
}

/// Wealth curve shifted by the starting budget.
pub fn with_budget(wealth: &Wealth, budget: f64) -> Array1<f64> {
    wealth.values().mapv(|w| w + budget)
}

/// Per-bar change, zero at the first bar.
///
/// As a rate, each change is divided by the previous value; a non-positive
/// previous value yields zero.
pub fn returns(series: ArrayView1<'_, f64>, rate: bool) -> Array1<f64> {
    let mut out = Array1::zeros(series.len());
    for t in 1..series.len() {
        let prev = series[t - 1];
        let change = series[t] - prev;
        out[t] = if !rate {
            change
        } else if prev > 0.0 {
            change / prev
        } else {
            0.0
        };
    }
    out
}

/// Average return over `n` bars implied by the first and last values.
pub fn average_return(series: ArrayView1<'_, f64>, rate: bool, n: usize) -> f64 {
    let (Some(&first), Some(&last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    let steps = series.len().saturating_sub(1);
    if steps == 0 {
        return 0.0;
    }
    let n = n as f64;
    let steps = steps as f64;
    if !rate {
        (last - first) * n / steps
    } else if first > 0.0 {
        (last / first).powf(n / steps) - 1.0
    } else {
        0.0
    }
}

/// Distance below the running peak, never positive.
pub fn drawdown(series: ArrayView1<'_, f64>, rate: bool) -> Array1<f64> {
    let mut peak = f64::NEG_INFINITY;
    series.mapv(|w| {
        peak = peak.max(w);
        let dd = w - peak;
        if !rate {
            dd
        } else if peak > 0.0 {
            dd / peak
        } else {
            0.0
        }
    })
}

pub fn max_drawdown(series: ArrayView1<'_, f64>, rate: bool) -> f64 {
    drawdown(series, rate).fold(0.0, |acc: f64, &dd| acc.min(dd))
}

/// Longest run of consecutive bars spent below a previous peak.
pub fn max_drawdown_duration(series: ArrayView1<'_, f64>) -> usize {
    let Some(&first) = series.first() else {
        return 0;
    };
    let mut peak = first;
    let mut current = 0usize;
    let mut longest = 0usize;
    for &w in series.iter() {
        if w >= peak {
            peak = w;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Population standard deviation of per-bar returns, first bar excluded.
pub fn volatility(series: ArrayView1<'_, f64>, rate: bool) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    returns(series, rate).slice(s![1..]).std(0.0)
}

/// Mean excess per-bar return over its volatility; zero for a flat curve.
pub fn sharpe_ratio(series: ArrayView1<'_, f64>, rate: bool, risk_free: f64) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let r = returns(series, rate);
    let body = r.slice(s![1..]);
    let std = body.std(0.0);
    if std <= 0.0 {
        return 0.0;
    }
    let mean = body.mean().unwrap_or(0.0);
    (mean - risk_free) / std
}

/// Mean trade P&L over its standard deviation.
pub fn tradewise_sharpe_ratio(trade_pnls: &[f64]) -> f64 {
    if trade_pnls.is_empty() {
        return 0.0;
    }
    let pnl = ArrayView1::from(trade_pnls);
    let mean = pnl.mean().unwrap_or(0.0);
    mean / pnl.std(0.0).max(EPSILON)
}

/// Exposure summed over trades, net of sign or absolute.
pub fn exposure(
    trades: &[Trade],
    panel: &PricePanel,
    net: bool,
) -> Result<Array1<f64>, TradeflowError> {
    let mut total = Array1::zeros(panel.n_bars());
    for trade in trades {
        total += &trade.series_exposure(panel, net)?;
    }
    Ok(total)
}

/// Bars held per trade, in `trade_id` order.
fn trade_durations(history: &History, panel: &PricePanel) -> Result<Vec<usize>, TradeflowError> {
    let per_order = history.durations(panel)?;
    let mut per_trade = vec![0; history.n_trades()];
    for (record, duration) in history.records().iter().zip(per_order) {
        per_trade[record.trade_id] = duration;
    }
    Ok(per_trade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(got: &Array1<f64>, want: &[f64]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-9, "{got} != {want:?}");
        }
    }

    fn pi_curve() -> Array1<f64> {
        array![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]
    }

    fn panel() -> PricePanel {
        PricePanel::from_columns(&[
            ("A0", vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]),
            ("A1", vec![2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0]),
        ])
        .unwrap()
    }

    fn executed(mut trades: Vec<Trade>, panel: &PricePanel) -> Vec<Trade> {
        for trade in &mut trades {
            trade.execute(panel).unwrap();
        }
        trades
    }

    #[test]
    fn returns_absolute_and_rate() {
        let w = pi_curve();
        assert_close(&returns(w.view(), false), &[0.0, -2.0, 3.0, -3.0, 4.0, 4.0, -7.0]);
        assert_close(
            &returns(w.view(), true),
            &[0.0, -2.0 / 3.0, 3.0, -3.0 / 4.0, 4.0, 4.0 / 5.0, -7.0 / 9.0],
        );
    }

    #[test]
    fn returns_of_flat_curve_are_zero() {
        let w = Array1::from_elem(10, 100.0);
        assert!(returns(w.view(), true).iter().all(|&r| r == 0.0));
        assert_eq!(volatility(w.view(), true), 0.0);
        assert_eq!(sharpe_ratio(w.view(), true, 0.0), 0.0);
    }

    #[test]
    fn average_return_hand() {
        let w = pi_curve();
        assert!((average_return(w.view(), false, 1) - (-1.0 / 6.0)).abs() < 1e-12);
        assert!((average_return(w.view(), true, 2) - ((2.0f64 / 3.0).powf(2.0 / 6.0) - 1.0)).abs() < 1e-12);
        assert_eq!(average_return(array![5.0].view(), true, 1), 0.0);
    }

    #[test]
    fn drawdown_hand() {
        let w = pi_curve();
        assert_close(&drawdown(w.view(), false), &[0.0, -2.0, 0.0, -3.0, 0.0, 0.0, -7.0]);
        assert_close(
            &drawdown(w.view(), true),
            &[0.0, -2.0 / 3.0, 0.0, -3.0 / 4.0, 0.0, 0.0, -7.0 / 9.0],
        );
        assert!((max_drawdown(w.view(), false) - (-7.0)).abs() < 1e-12);
        assert!((max_drawdown(w.view(), true) - (-7.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_duration_counts_bars_below_peak() {
        let w = array![100.0, 110.0, 100.0, 90.0, 85.0, 95.0];
        assert_eq!(max_drawdown_duration(w.view()), 4);
        assert_eq!(max_drawdown_duration(Array1::<f64>::zeros(0).view()), 0);
    }

    #[test]
    fn volatility_hand() {
        let w = pi_curve();
        let r = [-2.0, 3.0, -3.0, 4.0, 4.0, -7.0];
        let mean = r.iter().sum::<f64>() / 6.0;
        let var = r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 6.0;
        assert!((volatility(w.view(), false) - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sharpe_hand() {
        let w = array![0.0, 1.0, 3.0, 4.0];
        // returns 1, 2, 1: mean 4/3, population std sqrt(2/9)
        let expected = (4.0 / 3.0) / (2.0f64 / 9.0).sqrt();
        assert!((sharpe_ratio(w.view(), false, 0.0) - expected).abs() < 1e-12);
        let with_rf = (4.0 / 3.0 - 0.5) / (2.0f64 / 9.0).sqrt();
        assert!((sharpe_ratio(w.view(), false, 0.5) - with_rf).abs() < 1e-12);
    }

    #[test]
    fn tradewise_sharpe_floor() {
        assert_eq!(tradewise_sharpe_ratio(&[]), 0.0);
        assert!((tradewise_sharpe_ratio(&[1.0, 3.0]) - 2.0).abs() < 1e-12);
        assert!((tradewise_sharpe_ratio(&[2.0, 2.0]) - 2.0 / EPSILON).abs() < 1e-3);
    }

    #[test]
    fn exposure_hand() {
        let panel = panel();
        let trades = vec![
            Trade::single("A0", 2.0).unwrap().open_at(1i64).shut_at(5i64),
            Trade::single("A1", -3.0).unwrap().open_at(2i64).shut_at(4i64),
        ];
        let net = exposure(&trades, &panel, true).unwrap();
        assert_close(&net, &[0.0, 2.0, 5.0, -22.0, 4.0, 18.0, 0.0]);
        let abs = exposure(&trades, &panel, false).unwrap();
        assert_close(&abs, &[0.0, 2.0, 11.0, 26.0, 16.0, 18.0, 0.0]);
    }

    #[test]
    fn zero_lot_has_zero_exposure() {
        let panel = panel();
        let trades = vec![Trade::single("A0", 0.0).unwrap()];
        assert!(exposure(&trades, &panel, false).unwrap().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn compute_trade_stats() {
        let panel = panel();
        let trades = executed(
            vec![
                // +2 * (4 - 1) = 6
                Trade::single("A0", 2.0).unwrap().open_at(1i64).shut_at(2i64),
                // -1 * (8 - 1) = -7
                Trade::single("A1", -1.0).unwrap().open_at(2i64).shut_at(5i64),
                // flat
                Trade::single("A0", 0.0).unwrap().open_at(0i64).shut_at(6i64),
            ],
            &panel,
        );
        let history = History::from_trades(&trades).unwrap();
        let wealth = Wealth::zeros(&panel);
        let m = Metrics::compute(&history, &wealth, &panel, 0.0, 0.0).unwrap();
        assert_eq!(m.n_trades, 3);
        assert_eq!(m.trades_won, 1);
        assert_eq!(m.trades_lost, 1);
        assert_eq!(m.trades_breakeven, 1);
        assert!((m.win_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.profit_factor - 6.0 / 7.0).abs() < 1e-12);
        assert!((m.avg_win - 6.0).abs() < 1e-12);
        assert!((m.avg_loss - 7.0).abs() < 1e-12);
        assert!((m.largest_win - 6.0).abs() < 1e-12);
        assert!((m.largest_loss - 7.0).abs() < 1e-12);
        assert!((m.avg_trade_duration - (1.0 + 3.0 + 6.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn compute_empty_run() {
        let panel = panel();
        let m = Metrics::compute(&History::default(), &Wealth::zeros(&panel), &panel, 1000.0, 0.01)
            .unwrap();
        assert_eq!(m.final_wealth, 1000.0);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.n_trades, 0);
        assert_eq!(m.profit_factor, 0.0);
    }

    #[test]
    fn compute_total_return_with_budget() {
        let panel = panel();
        let trades = executed(
            vec![Trade::single("A0", 2.0).unwrap().open_at(1i64).shut_at(2i64)],
            &panel,
        );
        let history = History::from_trades(&trades).unwrap();
        let transaction =
            crate::domain::transaction::Transaction::from_history(&history, &panel).unwrap();
        let wealth = Wealth::from_transaction(&transaction, &panel).unwrap();
        let m = Metrics::compute(&history, &wealth, &panel, 100.0, 0.0).unwrap();
        assert!((m.final_wealth - 106.0).abs() < 1e-12);
        assert!((m.total_return - 0.06).abs() < 1e-12);
    }
}
