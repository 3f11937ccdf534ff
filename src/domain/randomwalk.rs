//! Synthetic price panels.

use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalkConfig {
    pub n_bars: usize,
    pub n_assets: usize,
    pub volatility: f64,
    pub seed: Option<u64>,
    pub name: String,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            n_bars: 1000,
            n_assets: 10,
            volatility: 0.01,
            seed: None,
            name: "RandomWalk".into(),
        }
    }
}

/// Panel whose per-bar gross returns are log-normal with sigma
/// `volatility`. Every asset starts at 1.0; bars are `0..n_bars` and
/// assets are named `"0"`, `"1"`, ...
pub fn make_randomwalk(config: &RandomWalkConfig) -> Result<PricePanel, TradeflowError> {
    if config.n_bars == 0 || config.n_assets == 0 {
        return Err(TradeflowError::Data {
            reason: "random walk needs at least one bar and one asset".into(),
        });
    }
    if !config.volatility.is_finite() || config.volatility < 0.0 {
        return Err(TradeflowError::Data {
            reason: format!("volatility {} must be finite and >= 0", config.volatility),
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut prices = Array2::from_shape_fn((config.n_bars, config.n_assets), |_| {
        (config.volatility * standard_normal(&mut rng)).exp()
    });
    prices.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr *= prev);
    let first = prices.row(0).to_owned();
    for mut row in prices.rows_mut() {
        row /= &first;
    }

    let bars = (0..config.n_bars as i64).map(Bar::Index).collect();
    let assets = (0..config.n_assets).map(|i| i.to_string()).collect();
    Ok(PricePanel::new(bars, assets, prices)?.with_name(config.name.clone()))
}

/// Box-Muller draw from N(0, 1).
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); shift to (0, 1] so ln stays finite.
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}
