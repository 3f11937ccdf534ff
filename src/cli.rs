//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvPanelAdapter, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    DataSettings, DataSource, RunSettings, StrategySettings, validate_config,
};
use crate::domain::error::TradeflowError;
use crate::domain::metrics::Metrics;
use crate::domain::observer::LogObserver;
use crate::domain::panel::PricePanel;
use crate::domain::randomwalk::make_randomwalk;
use crate::domain::strategy::Strategy;
use crate::ports::panel_port::PanelPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "report";

#[derive(Parser, Debug)]
#[command(name = "tradeflow", about = "Trade-list backtester over price panels")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Describe a price panel CSV
    Info {
        #[arg(short, long)]
        prices: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            dry_run,
        } => run_backtest(&config, output.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::Info { prices } => run_info(&prices),
    }
}

fn fail(err: TradeflowError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Load the configured panel and cut it to `begin_bar..=end_bar`.
pub fn load_panel(data: &DataSettings) -> Result<PricePanel, TradeflowError> {
    let panel = match &data.source {
        DataSource::Csv { path } => CsvPanelAdapter::new(path).load_panel()?,
        DataSource::RandomWalk(config) => make_randomwalk(config)?,
    };
    if data.begin_bar.is_none() && data.end_bar.is_none() {
        return Ok(panel);
    }
    let (Some(first), Some(last)) = (panel.first_bar(), panel.last_bar()) else {
        return Ok(panel);
    };
    let begin = data.begin_bar.as_ref().unwrap_or(first);
    let end = data.end_bar.as_ref().unwrap_or(last);
    panel.slice(begin, end)
}

pub fn build_strategy(settings: &StrategySettings) -> Box<dyn Strategy> {
    match settings {
        StrategySettings::BuyAndHold(strategy) => Box::new(strategy.clone()),
        StrategySettings::Random(strategy) => Box::new(strategy.clone()),
    }
}

fn run_backtest(config_path: &Path, output: Option<&Path>, dry_run: bool) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match validate_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // Stage 2: Load price panel
    let panel = match load_panel(&settings.data) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    eprintln!(
        "Panel {}: {} bars x {} assets",
        panel.name().unwrap_or("<unnamed>"),
        panel.n_bars(),
        panel.n_assets()
    );

    let strategy = build_strategy(&settings.strategy);
    if dry_run {
        print_settings(&settings, strategy.as_ref());
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    let output_dir = output
        .map(Path::to_path_buf)
        .or_else(|| settings.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    run_backtest_pipeline(
        strategy.as_ref(),
        &panel,
        &settings.backtest,
        &CsvReportAdapter,
        &output_dir,
    )
}

pub fn run_backtest_pipeline(
    strategy: &dyn Strategy,
    panel: &PricePanel,
    config: &BacktestConfig,
    report: &dyn ReportPort,
    output_dir: &Path,
) -> ExitCode {
    // Stage 3: Generate, execute, aggregate
    let mut observer = LogObserver::new();
    let result = match backtest_engine::run_backtest(strategy, panel, config, &mut observer) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 4: Metrics
    let metrics = match result.metrics(panel) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };
    print_summary(&result, &metrics);

    // Stage 5: Report
    match report.write(&result, output_dir) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_summary(result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== {} ===", result.strategy);
    eprintln!("Trades:           {}", metrics.n_trades);
    eprintln!("Orders:           {}", result.history.n_orders());
    eprintln!("Final Wealth:     {:.2}", metrics.final_wealth);
    if result.config.budget > 0.0 {
        eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
        eprintln!("Max Drawdown:     {:.1}%", metrics.max_drawdown_rate * 100.0);
    } else {
        eprintln!("Max Drawdown:     {:.2}", metrics.max_drawdown);
    }
    eprintln!("Volatility:       {:.4}", metrics.volatility);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Tradewise Sharpe: {:.2}", metrics.tradewise_sharpe_ratio);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Duration:     {:.1} bars", metrics.avg_trade_duration);
}

fn print_settings(settings: &RunSettings, strategy: &dyn Strategy) {
    eprintln!("\nData:");
    match &settings.data.source {
        DataSource::Csv { path } => eprintln!("  prices: {path}"),
        DataSource::RandomWalk(rw) => eprintln!(
            "  random walk: {} bars, {} assets, volatility {}",
            rw.n_bars, rw.n_assets, rw.volatility
        ),
    }
    if let Some(bar) = &settings.data.begin_bar {
        eprintln!("  begin_bar: {bar}");
    }
    if let Some(bar) = &settings.data.end_bar {
        eprintln!("  end_bar: {bar}");
    }

    eprintln!("\nBacktest:");
    eprintln!("  budget: {}", settings.backtest.budget);
    eprintln!("  allow_empty: {}", settings.backtest.allow_empty);
    eprintln!("  risk_free_rate: {}", settings.backtest.risk_free_rate);

    eprintln!("\nStrategy:");
    eprintln!("  {}", strategy.name());
    if let Some(description) = strategy.description() {
        eprintln!("  {description}");
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match validate_config(&adapter) {
        Ok(settings) => {
            let strategy = build_strategy(&settings.strategy);
            eprintln!("Config validated successfully");
            print_settings(&settings, strategy.as_ref());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_info(prices: &Path) -> ExitCode {
    let panel = match CsvPanelAdapter::new(prices).load_panel() {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let span = match (panel.first_bar(), panel.last_bar()) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "empty".to_string(),
    };
    println!(
        "{}: {} bars, {} assets, {}",
        panel.name().unwrap_or("<unnamed>"),
        panel.n_bars(),
        panel.n_assets(),
        span
    );
    for (i, asset) in panel.assets().iter().enumerate() {
        let prices = panel.asset_prices(i);
        let min = prices.fold(f64::INFINITY, |acc, &p| acc.min(p));
        let max = prices.fold(f64::NEG_INFINITY, |acc, &p| acc.max(p));
        println!("  {asset}: min {min}, max {max}");
    }
    ExitCode::SUCCESS
}
