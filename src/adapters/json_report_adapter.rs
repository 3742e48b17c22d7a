//! JSON report adapter.

use serde::Serialize;
use std::path::Path;

use crate::domain::backtest::{BacktestResult, BacktestRow};
use crate::domain::error::SmacrossError;
use crate::domain::sweep::SweepResults;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

#[derive(Serialize)]
struct BacktestReport {
    short_window: usize,
    long_window: usize,
    initial_investment: f64,
    warmup: String,
    terminal_value: f64,
    total_return: f64,
    buy_dates: Vec<chrono::NaiveDate>,
    sell_dates: Vec<chrono::NaiveDate>,
    rows: Vec<BacktestRow>,
}

impl BacktestReport {
    fn from_result(result: &BacktestResult) -> Self {
        BacktestReport {
            short_window: result.config.short_window,
            long_window: result.config.long_window,
            initial_investment: result.config.initial_investment,
            warmup: result.config.warmup.to_string(),
            terminal_value: result.terminal_value,
            total_return: result.total_return(),
            buy_dates: result.buy_dates(),
            sell_dates: result.sell_dates(),
            rows: result.rows(),
        }
    }
}

impl JsonReportAdapter {
    pub fn backtest_to_string(result: &BacktestResult) -> Result<String, SmacrossError> {
        serde_json::to_string_pretty(&BacktestReport::from_result(result)).map_err(|e| {
            SmacrossError::Report {
                reason: e.to_string(),
            }
        })
    }

    pub fn sweep_to_string(results: &SweepResults) -> Result<String, SmacrossError> {
        serde_json::to_string_pretty(results.entries()).map_err(|e| SmacrossError::Report {
            reason: e.to_string(),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), SmacrossError> {
        let content = Self::backtest_to_string(result)?;
        std::fs::write(output_path, content).map_err(|e| SmacrossError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }

    fn write_sweep(
        &self,
        results: &SweepResults,
        output_path: &Path,
    ) -> Result<(), SmacrossError> {
        let content = Self::sweep_to_string(results)?;
        std::fs::write(output_path, content).map_err(|e| SmacrossError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
