//! Price source port trait.
//!
//! Adapters normalize whatever they read into a validated [`PriceSeries`];
//! parse and I/O failures are reported as `SmacrossError::Data`.

use crate::domain::error::SmacrossError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Prices for `symbol` within the inclusive range. `None` leaves that
    /// side of the range open.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SmacrossError>;

    fn list_symbols(&self) -> Result<Vec<String>, SmacrossError>;

    /// First date, last date and point count, or `None` when there is no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError> {
        let series = self.fetch_prices(symbol, None, None)?;
        Ok(match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => Some((first, last, series.len())),
            _ => None,
        })
    }
}
