//! CSV file price adapter.
//!
//! Reads `<SYMBOL>.csv` from a base directory. The `date` column (YYYY-MM-DD)
//! and the `close` column (or `price` when there is no `close`) are located
//! by header name; other columns are ignored.

use crate::domain::error::SmacrossError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SmacrossError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| SmacrossError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| SmacrossError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        let date_col =
            Self::column_index(&headers, &["date"]).ok_or_else(|| SmacrossError::Data {
                reason: format!("missing date column in {}", path.display()),
            })?;
        let price_col = Self::column_index(&headers, &["close", "price"]).ok_or_else(|| {
            SmacrossError::Data {
                reason: format!("missing close column in {}", path.display()),
            }
        })?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).ok_or_else(|| SmacrossError::Data {
                reason: "missing date value".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                SmacrossError::Data {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let price: f64 = record
                .get(price_col)
                .ok_or_else(|| SmacrossError::Data {
                    reason: format!("missing close value on {}", date),
                })?
                .trim()
                .parse()
                .map_err(|e| SmacrossError::Data {
                    reason: format!("invalid close value on {}: {}", date, e),
                })?;

            points.push(PricePoint::new(date, price));
        }

        PriceSeries::from_unsorted(points).map_err(|e| SmacrossError::Data {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmacrossError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SmacrossError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SmacrossError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
