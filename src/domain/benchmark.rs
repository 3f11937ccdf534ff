//! Benchmark strategies.

use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Replays a fixed list of trades.
#[derive(Debug, Clone)]
pub struct DeterminedTrader {
    trades: Vec<Trade>,
}

impl DeterminedTrader {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self { trades }
    }
}

impl Strategy for DeterminedTrader {
    fn logic(&self, _panel: &PricePanel) -> Vec<Trade> {
        self.trades.clone()
    }

    fn name(&self) -> String {
        "DeterminedTrader".into()
    }
}

/// Holds value-weighted positions from the first bar to the last.
///
/// Each weight is a cash amount: the lot is `weight / first_price`.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    weights: Vec<(String, f64)>,
}

impl BuyAndHold {
    pub fn new(weights: Vec<(String, f64)>) -> Result<Self, TradeflowError> {
        if weights.is_empty() {
            return Err(invalid("buy-and-hold needs at least one weight".into()));
        }
        let mut seen = HashSet::new();
        for (asset, weight) in &weights {
            if !weight.is_finite() {
                return Err(invalid(format!("weight {weight} for {asset} is not finite")));
            }
            if !seen.insert(asset.as_str()) {
                return Err(invalid(format!("asset {asset} weighted twice")));
            }
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &[(String, f64)] {
        &self.weights
    }
}

impl Strategy for BuyAndHold {
    fn logic(&self, panel: &PricePanel) -> Vec<Trade> {
        let Some(first_prices) = panel.first_prices() else {
            return Vec::new();
        };
        // Assets missing from the panel keep their raw weight so that
        // execution reports them as unknown.
        let lots = self.weights.iter().map(|(asset, weight)| {
            match usize::try_from(panel.asset_index(asset)) {
                Ok(i) => weight / first_prices[i],
                Err(_) => *weight,
            }
        });
        let assets = self.weights.iter().map(|(asset, _)| asset.clone());
        match Trade::new(assets, lots) {
            Ok(trade) => {
                let trade = match panel.first_bar() {
                    Some(bar) => trade.open_at(bar.clone()),
                    None => trade,
                };
                vec![trade]
            }
            Err(e) => {
                log::warn!("buy-and-hold skipped: {e}");
                Vec::new()
            }
        }
    }

    fn name(&self) -> String {
        "BuyAndHold".into()
    }

    fn description(&self) -> Option<String> {
        let legs: Vec<String> = self
            .weights
            .iter()
            .map(|(asset, weight)| format!("{asset}:{weight}"))
            .collect();
        Some(format!("buy and hold {}", legs.join(",")))
    }
}

/// Seeded random trades, for exercising the pipeline and as a null model.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomTrader {
    pub n_trades: usize,
    pub max_orders: usize,
    pub min_lot: f64,
    pub max_lot: f64,
    pub seed: Option<u64>,
    pub take: Option<f64>,
    pub stop: Option<f64>,
}

impl Default for RandomTrader {
    fn default() -> Self {
        Self {
            n_trades: 100,
            max_orders: 5,
            min_lot: -100.0,
            max_lot: 100.0,
            seed: None,
            take: None,
            stop: None,
        }
    }
}

impl RandomTrader {
    pub fn validate(&self) -> Result<(), TradeflowError> {
        if self.max_orders == 0 {
            return Err(invalid("max_orders must be at least 1".into()));
        }
        if !self.min_lot.is_finite() || !self.max_lot.is_finite() || self.min_lot > self.max_lot {
            return Err(invalid(format!(
                "lot range [{}, {}] is not a finite interval",
                self.min_lot, self.max_lot
            )));
        }
        if let Some(take) = self.take {
            Trade::single("_", 0.0)?.take_profit(take)?;
        }
        if let Some(stop) = self.stop {
            Trade::single("_", 0.0)?.stop_loss(stop)?;
        }
        Ok(())
    }

    fn random_trade(&self, panel: &PricePanel, rng: &mut StdRng) -> Result<Trade, TradeflowError> {
        let n_assets = panel.n_assets();
        let n_orders = rng.gen_range(1..=self.max_orders.min(n_assets));
        let assets = sample(rng, n_assets, n_orders)
            .into_iter()
            .map(|i| panel.assets()[i].clone())
            .collect::<Vec<_>>();
        let lots = (0..n_orders)
            .map(|_| rng.gen_range(self.min_lot..=self.max_lot))
            .collect::<Vec<_>>();

        let mut bars = sample(rng, panel.n_bars(), 2).into_vec();
        bars.sort_unstable();
        let bar_ids = panel.bars();

        let mut trade = Trade::new(assets, lots)?
            .open_at(bar_ids[bars[0]].clone())
            .shut_at(bar_ids[bars[1]].clone());
        if let Some(take) = self.take {
            trade = trade.take_profit(take)?;
        }
        if let Some(stop) = self.stop {
            trade = trade.stop_loss(stop)?;
        }
        Ok(trade)
    }
}

impl Strategy for RandomTrader {
    fn logic(&self, panel: &PricePanel) -> Vec<Trade> {
        if panel.n_assets() == 0 || panel.n_bars() < 2 {
            log::warn!("random trader needs at least one asset and two bars");
            return Vec::new();
        }
        if let Err(e) = self.validate() {
            log::warn!("random trader skipped: {e}");
            return Vec::new();
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut trades = Vec::with_capacity(self.n_trades);
        for _ in 0..self.n_trades {
            match self.random_trade(panel, &mut rng) {
                Ok(trade) => trades.push(trade),
                Err(e) => log::warn!("random trade skipped: {e}"),
            }
        }
        trades
    }

    fn name(&self) -> String {
        "RandomTrader".into()
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "{} random trades, up to {} orders, lots in [{}, {}]",
            self.n_trades, self.max_orders, self.min_lot, self.max_lot
        ))
    }
}

fn invalid(reason: String) -> TradeflowError {
    TradeflowError::InvalidTrade { reason }
}
