//! Configuration validation.
//!
//! Every key is checked before a run. Each `validate_*` function returns
//! the typed settings for its section so the caller never re-reads raw
//! values.

use crate::domain::backtest::BacktestConfig;
use crate::domain::bar::Bar;
use crate::domain::benchmark::{BuyAndHold, RandomTrader};
use crate::domain::error::TradeflowError;
use crate::domain::randomwalk::RandomWalkConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv { path: String },
    RandomWalk(RandomWalkConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub source: DataSource,
    pub begin_bar: Option<Bar>,
    pub end_bar: Option<Bar>,
}

#[derive(Debug, Clone)]
pub enum StrategySettings {
    BuyAndHold(BuyAndHold),
    Random(RandomTrader),
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub data: DataSettings,
    pub backtest: BacktestConfig,
    pub strategy: StrategySettings,
    pub output_dir: Option<String>,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<RunSettings, TradeflowError> {
    Ok(RunSettings {
        data: validate_data_config(config)?,
        backtest: validate_backtest_config(config)?,
        strategy: validate_strategy_config(config)?,
        output_dir: non_empty(config, "report", "output_dir"),
    })
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<DataSettings, TradeflowError> {
    let source = match non_empty(config, "data", "source").as_deref() {
        None | Some("csv") => match non_empty(config, "data", "prices") {
            Some(path) => DataSource::Csv { path },
            None => return Err(missing("data", "prices")),
        },
        Some("randomwalk") => DataSource::RandomWalk(validate_randomwalk(config)?),
        Some(other) => {
            return Err(invalid(
                "data",
                "source",
                format!("unknown source '{other}', expected csv or randomwalk"),
            ));
        }
    };

    Ok(DataSettings {
        source,
        begin_bar: non_empty(config, "data", "begin_bar").map(|s| Bar::parse(&s)),
        end_bar: non_empty(config, "data", "end_bar").map(|s| Bar::parse(&s)),
    })
}

fn validate_randomwalk(config: &dyn ConfigPort) -> Result<RandomWalkConfig, TradeflowError> {
    let defaults = RandomWalkConfig::default();
    let n_bars = read_count(config, "data", "n_bars")?.unwrap_or(defaults.n_bars);
    if n_bars == 0 {
        return Err(invalid("data", "n_bars", "n_bars must be at least 1".into()));
    }
    let n_assets = read_count(config, "data", "n_assets")?.unwrap_or(defaults.n_assets);
    if n_assets == 0 {
        return Err(invalid("data", "n_assets", "n_assets must be at least 1".into()));
    }
    let volatility = read_double(config, "data", "volatility")?.unwrap_or(defaults.volatility);
    if volatility < 0.0 {
        return Err(invalid(
            "data",
            "volatility",
            "volatility must be non-negative".into(),
        ));
    }
    Ok(RandomWalkConfig {
        n_bars,
        n_assets,
        volatility,
        seed: read_seed(config, "data")?,
        ..defaults
    })
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradeflowError> {
    let budget = read_double(config, "backtest", "budget")?.unwrap_or(0.0);
    if budget < 0.0 {
        return Err(invalid(
            "backtest",
            "budget",
            "budget must be non-negative".into(),
        ));
    }
    let risk_free_rate = read_double(config, "backtest", "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1".into(),
        ));
    }
    Ok(BacktestConfig {
        budget,
        allow_empty: config.get_bool("backtest", "allow_empty", false),
        risk_free_rate,
    })
}

pub fn validate_strategy_config(
    config: &dyn ConfigPort,
) -> Result<StrategySettings, TradeflowError> {
    match non_empty(config, "strategy", "kind").as_deref() {
        None => Err(missing("strategy", "kind")),
        Some("buy_and_hold") => validate_buy_and_hold(config).map(StrategySettings::BuyAndHold),
        Some("random") => validate_random(config).map(StrategySettings::Random),
        Some(other) => Err(invalid(
            "strategy",
            "kind",
            format!("unknown kind '{other}', expected buy_and_hold or random"),
        )),
    }
}

fn validate_buy_and_hold(config: &dyn ConfigPort) -> Result<BuyAndHold, TradeflowError> {
    let items = config.get_list("strategy", "weights");
    if items.is_empty() {
        return Err(missing("strategy", "weights"));
    }
    let mut weights = Vec::with_capacity(items.len());
    for item in &items {
        let Some((asset, weight)) = item.split_once(':') else {
            return Err(invalid(
                "strategy",
                "weights",
                format!("'{item}' is not ASSET:WEIGHT"),
            ));
        };
        let weight = weight.trim().parse::<f64>().map_err(|_| {
            invalid(
                "strategy",
                "weights",
                format!("weight '{}' for {} is not a number", weight.trim(), asset.trim()),
            )
        })?;
        weights.push((asset.trim().to_string(), weight));
    }
    BuyAndHold::new(weights).map_err(|e| invalid("strategy", "weights", e.to_string()))
}

fn validate_random(config: &dyn ConfigPort) -> Result<RandomTrader, TradeflowError> {
    let defaults = RandomTrader::default();
    let n_trades = read_count(config, "strategy", "n_trades")?.unwrap_or(defaults.n_trades);
    if n_trades == 0 {
        return Err(invalid(
            "strategy",
            "n_trades",
            "n_trades must be at least 1".into(),
        ));
    }
    let max_orders = read_count(config, "strategy", "max_orders")?.unwrap_or(defaults.max_orders);
    if max_orders == 0 {
        return Err(invalid(
            "strategy",
            "max_orders",
            "max_orders must be at least 1".into(),
        ));
    }
    let min_lot = read_double(config, "strategy", "min_lot")?.unwrap_or(defaults.min_lot);
    let max_lot = read_double(config, "strategy", "max_lot")?.unwrap_or(defaults.max_lot);
    if min_lot > max_lot {
        return Err(invalid(
            "strategy",
            "min_lot",
            "min_lot must not exceed max_lot".into(),
        ));
    }
    let take = read_double(config, "strategy", "take")?;
    if take.is_some_and(|t| t < 0.0) {
        return Err(invalid("strategy", "take", "take must be non-negative".into()));
    }
    let stop = read_double(config, "strategy", "stop")?;
    if stop.is_some_and(|s| s > 0.0) {
        return Err(invalid("strategy", "stop", "stop must be non-positive".into()));
    }

    Ok(RandomTrader {
        n_trades,
        max_orders,
        min_lot,
        max_lot,
        seed: read_seed(config, "strategy")?,
        take,
        stop,
    })
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TradeflowError> {
    let Some(raw) = non_empty(config, section, key) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(invalid(
            section,
            key,
            format!("'{raw}' is not a finite number"),
        )),
    }
}

fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, TradeflowError> {
    let Some(raw) = non_empty(config, section, key) else {
        return Ok(None);
    };
    raw.parse::<usize>().map(Some).map_err(|_| {
        invalid(
            section,
            key,
            format!("'{raw}' is not a non-negative integer"),
        )
    })
}

fn read_seed(config: &dyn ConfigPort, section: &str) -> Result<Option<u64>, TradeflowError> {
    let Some(raw) = non_empty(config, section, "seed") else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| invalid(section, "seed", format!("'{raw}' is not a valid seed")))
}

fn missing(section: &str, key: &str) -> TradeflowError {
    TradeflowError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> TradeflowError {
    TradeflowError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
