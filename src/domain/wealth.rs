//! Cumulative mark-to-market wealth over the panel span.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use crate::domain::transaction::Transaction;
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip, s};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Wealth {
    bars: Vec<Bar>,
    values: Array1<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WealthRecord {
    pub bar: Bar,
    pub wealth: f64,
}

impl Wealth {
    /// Integrate held positions against bar-to-bar price changes.
    ///
    /// Holdings entering bar `t` are the transactions accumulated through
    /// `t - 1`, so a position contributes nothing on its open bar and still
    /// earns the move into its close bar.
    pub fn from_transaction(
        transaction: &Transaction,
        panel: &PricePanel,
    ) -> Result<Self, TradeflowError> {
        let shape = (panel.n_bars(), panel.n_assets());
        if transaction.matrix().dim() != shape {
            return Err(TradeflowError::InvalidPanel {
                axis: "prices".into(),
                reason: format!(
                    "transaction shape {:?} does not match panel {:?}",
                    transaction.matrix().dim(),
                    shape
                ),
            });
        }
        if transaction.bars() != panel.bars() {
            return Err(TradeflowError::InvalidPanel {
                axis: "bars".into(),
                reason: "transaction bars differ from panel bars".into(),
            });
        }
        if transaction.assets() != panel.assets() {
            return Err(TradeflowError::InvalidPanel {
                axis: "assets".into(),
                reason: "transaction assets differ from panel assets".into(),
            });
        }

        let n_bars = shape.0;
        let mut held = Array2::<f64>::zeros(shape);
        let mut price_change = Array2::<f64>::zeros(shape);
        if n_bars > 1 {
            let positions = transaction.positions();
            held.slice_mut(s![1.., ..])
                .assign(&positions.slice(s![..n_bars - 1, ..]));

            let prices = panel.prices();
            Zip::from(price_change.slice_mut(s![1.., ..]))
                .and(prices.slice(s![1.., ..]))
                .and(prices.slice(s![..n_bars - 1, ..]))
                .for_each(|d, &curr, &prev| *d = curr - prev);
        }

        let mut values = (held * price_change).sum_axis(Axis(1));
        values.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);

        Ok(Self {
            bars: panel.bars().to_vec(),
            values,
        })
    }

    /// Flat zero wealth over every bar of `panel`.
    pub fn zeros(panel: &PricePanel) -> Self {
        Self {
            bars: panel.bars().to_vec(),
            values: Array1::zeros(panel.n_bars()),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Wealth at the last bar, zero for an empty span.
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    pub fn records(&self) -> Vec<WealthRecord> {
        self.bars
            .iter()
            .zip(self.values.iter())
            .map(|(bar, &wealth)| WealthRecord {
                bar: bar.clone(),
                wealth,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::History;
    use crate::domain::trade::Trade;
    use approx::assert_abs_diff_eq;

    fn panel() -> PricePanel {
        PricePanel::from_columns(&[
            ("A0", vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]),
            ("A1", vec![2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0]),
        ])
        .unwrap()
    }

    fn wealth_of(mut trades: Vec<Trade>, panel: &PricePanel) -> Wealth {
        for trade in &mut trades {
            trade.execute(panel).unwrap();
        }
        let history = History::from_trades(&trades).unwrap();
        let transaction = Transaction::from_history(&history, panel).unwrap();
        Wealth::from_transaction(&transaction, panel).unwrap()
    }

    #[test]
    fn two_leg_trade() {
        let panel = panel();
        let wealth = wealth_of(
            vec![
                Trade::new(["A0", "A1"], [2.0, -3.0])
                    .unwrap()
                    .open_at(1i64)
                    .shut_at(3i64),
            ],
            &panel,
        );
        let expected = [0.0, 0.0, 24.0, -3.0, -3.0, -3.0, -3.0];
        for (got, want) in wealth.values().iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(wealth.final_value(), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn matches_summed_trade_pnl() {
        let panel = panel();
        let mut trades = vec![
            Trade::single("A0", 1.5).unwrap().open_at(0i64).shut_at(5i64),
            Trade::single("A1", -2.0)
                .unwrap()
                .open_at(2i64)
                .take_profit(5.0)
                .unwrap(),
        ];
        for trade in &mut trades {
            trade.execute(&panel).unwrap();
        }
        let mut expected = Array1::<f64>::zeros(panel.n_bars());
        for trade in &trades {
            expected = expected + trade.series_pnl(&panel).unwrap();
        }
        let history = History::from_trades(&trades).unwrap();
        let transaction = Transaction::from_history(&history, &panel).unwrap();
        let wealth = Wealth::from_transaction(&transaction, &panel).unwrap();
        for (got, want) in wealth.values().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_history_is_flat_zero() {
        let panel = panel();
        let transaction = Transaction::from_history(&History::default(), &panel).unwrap();
        let wealth = Wealth::from_transaction(&transaction, &panel).unwrap();
        assert_eq!(wealth.len(), 7);
        assert!(wealth.values().iter().all(|&w| w == 0.0));
        assert_eq!(wealth, Wealth::zeros(&panel));
    }

    #[test]
    fn single_bar_panel() {
        let panel = PricePanel::from_columns(&[("A0", vec![10.0])]).unwrap();
        let wealth = wealth_of(vec![Trade::single("A0", 1.0).unwrap()], &panel);
        assert_eq!(wealth.values().to_vec(), vec![0.0]);
    }

    #[test]
    fn rejects_mismatched_panel() {
        let panel = panel();
        let other = PricePanel::from_columns(&[("A0", vec![1.0, 2.0])]).unwrap();
        let transaction = Transaction::from_history(&History::default(), &other).unwrap();
        assert!(matches!(
            Wealth::from_transaction(&transaction, &panel),
            Err(TradeflowError::InvalidPanel { .. })
        ));
    }

    #[test]
    fn rejects_same_shape_from_other_panel() {
        let panel = panel();
        let renamed = PricePanel::from_columns(&[
            ("B0", vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]),
            ("A1", vec![2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0]),
        ])
        .unwrap();
        let transaction = Transaction::from_history(&History::default(), &renamed).unwrap();
        assert!(matches!(
            Wealth::from_transaction(&transaction, &panel),
            Err(TradeflowError::InvalidPanel { axis, .. }) if axis == "assets"
        ));

        let shifted = panel.slice(&Bar::Index(1), &Bar::Index(6)).unwrap();
        let reindexed = PricePanel::from_columns(&[
            ("A0", vec![1.0, 4.0, 1.0, 5.0, 9.0, 2.0]),
            ("A1", vec![7.0, 1.0, 8.0, 2.0, 8.0, 1.0]),
        ])
        .unwrap();
        let transaction = Transaction::from_history(&History::default(), &reindexed).unwrap();
        assert!(matches!(
            Wealth::from_transaction(&transaction, &shifted),
            Err(TradeflowError::InvalidPanel { axis, .. }) if axis == "bars"
        ));
    }

    #[test]
    fn records_pair_bars_with_values() {
        let panel = panel();
        let wealth = Wealth::zeros(&panel);
        let records = wealth.records();
        assert_eq!(records.len(), 7);
        assert_eq!(records[6].bar, Bar::Index(6));
        assert_eq!(records[6].wealth, 0.0);
    }
}
