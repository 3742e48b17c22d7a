//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::sweep::SweepResults;

/// Port for writing backtest and sweep output for presentation consumers.
pub trait ReportPort {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), SmacrossError>;

    fn write_sweep(
        &self,
        results: &SweepResults,
        output_path: &Path,
    ) -> Result<(), SmacrossError>;
}
