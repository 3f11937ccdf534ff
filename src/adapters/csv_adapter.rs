//! CSV adapters: wide price panels in, result tables out.

use crate::domain::backtest::BacktestResult;
use crate::domain::bar::Bar;
use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;
use crate::ports::panel_port::PanelPort;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "history.csv";
pub const TRANSACTION_FILE: &str = "transaction.csv";
pub const WEALTH_FILE: &str = "wealth.csv";

/// Reads a panel from `bar,<asset>,<asset>,...` rows.
pub struct CsvPanelAdapter {
    path: PathBuf,
}

impl CsvPanelAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PanelPort for CsvPanelAdapter {
    fn load_panel(&self) -> Result<PricePanel, TradeflowError> {
        let path = &self.path;
        let mut rdr = csv::Reader::from_path(path).map_err(|e| TradeflowError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let header = rdr.headers().map_err(|e| TradeflowError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let assets: Vec<String> = header.iter().skip(1).map(|a| a.trim().to_string()).collect();
        if assets.is_empty() {
            return Err(TradeflowError::Data {
                reason: format!("{} has no asset columns", path.display()),
            });
        }

        let mut bars = Vec::new();
        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TradeflowError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let bar = record.get(0).ok_or_else(|| TradeflowError::Data {
                reason: format!("row {} is missing the bar column", line + 1),
            })?;
            let row = record
                .iter()
                .skip(1)
                .zip(&assets)
                .map(|(cell, asset)| {
                    cell.trim().parse::<f64>().map_err(|e| TradeflowError::Data {
                        reason: format!("invalid price for {} at bar {}: {}", asset, bar, e),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            bars.push(Bar::parse(bar));
            rows.push(row);
        }

        let panel = PricePanel::from_rows(bars, assets, rows)?;
        Ok(match path.file_stem() {
            Some(stem) => panel.with_name(stem.to_string_lossy()),
            None => panel,
        })
    }
}

/// Writes history, transaction and wealth tables into one directory.
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), TradeflowError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        for record in records {
            wtr.serialize(record).map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TradeflowError> {
        fs::create_dir_all(output_dir)?;
        Self::write_records(&output_dir.join(HISTORY_FILE), result.history.records())?;
        Self::write_records(
            &output_dir.join(TRANSACTION_FILE),
            &result.transaction.records(),
        )?;
        Self::write_records(&output_dir.join(WEALTH_FILE), &result.wealth.records())?;
        log::info!("report written to {}", output_dir.display());
        Ok(())
    }
}

fn csv_error(path: &Path, e: csv::Error) -> TradeflowError {
    TradeflowError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}
