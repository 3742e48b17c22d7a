//! CSV report adapter.
//!
//! Backtest: one row per period with both SMAs, signals, applied position and
//! portfolio value. Undefined SMA values are written as empty fields.
//! Sweep: one row per window pair, best first.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::signal::Signal;
use crate::domain::sweep::SweepResults;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

fn report_err(e: impl std::fmt::Display) -> SmacrossError {
    SmacrossError::Report {
        reason: e.to_string(),
    }
}

fn opt_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvReportAdapter {
    pub fn backtest_to_string(result: &BacktestResult) -> Result<String, SmacrossError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "date",
            "price",
            "short_sma",
            "long_sma",
            "buy",
            "sell",
            "position",
            "portfolio_value",
        ])
        .map_err(report_err)?;

        for row in result.rows() {
            wtr.write_record([
                row.date.to_string(),
                row.price.to_string(),
                opt_field(row.short_sma),
                opt_field(row.long_sma),
                (row.signal == Signal::Buy).to_string(),
                (row.signal == Signal::Sell).to_string(),
                row.position.value().to_string(),
                row.portfolio_value.to_string(),
            ])
            .map_err(report_err)?;
        }

        let bytes = wtr.into_inner().map_err(report_err)?;
        String::from_utf8(bytes).map_err(report_err)
    }

    pub fn sweep_to_string(results: &SweepResults) -> Result<String, SmacrossError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "short_window",
            "long_window",
            "terminal_value",
            "total_return",
            "trades",
        ])
        .map_err(report_err)?;

        for entry in results.entries() {
            wtr.write_record([
                entry.short_window.to_string(),
                entry.long_window.to_string(),
                entry.terminal_value.to_string(),
                entry.total_return.to_string(),
                entry.trades.to_string(),
            ])
            .map_err(report_err)?;
        }

        let bytes = wtr.into_inner().map_err(report_err)?;
        String::from_utf8(bytes).map_err(report_err)
    }
}

impl ReportPort for CsvReportAdapter {
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
