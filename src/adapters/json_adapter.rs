//! JSON historical price document adapter.
//!
//! Reads `<SYMBOL>.json` from a base directory, in the shape written by the
//! historical-price fetch job:
//!
//! ```json
//! { "bpi": { "2020-01-01": { "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0 } } }
//! ```
//!
//! A bare number is accepted in place of the OHLC object.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::SmacrossError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Debug, Deserialize)]
struct HistoricalDocument {
    bpi: BTreeMap<String, BpiValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BpiValue {
    Ohlc { close: f64 },
    Close(f64),
}

impl BpiValue {
    fn close(&self) -> f64 {
        match self {
            BpiValue::Ohlc { close } => *close,
            BpiValue::Close(close) => *close,
        }
    }
}

pub struct JsonAdapter {
    base_path: PathBuf,
}

impl JsonAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn json_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", symbol))
    }

    /// Parse a document already in memory.
    pub fn parse_document(
        content: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SmacrossError> {
        let doc: HistoricalDocument =
            serde_json::from_str(content).map_err(|e| SmacrossError::Data {
                reason: format!("JSON parse error: {}", e),
            })?;

        let mut points = Vec::with_capacity(doc.bpi.len());
        for (key, value) in &doc.bpi {
            let date = parse_key(key)?;
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }
            points.push(PricePoint::new(date, value.close()));
        }

        PriceSeries::from_unsorted(points).map_err(|e| SmacrossError::Data {
            reason: e.to_string(),
        })
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a `T` time part
/// (`2020-01-01T00:00:00`, with fractional seconds, `Z` or an offset).
fn parse_key(key: &str) -> Result<NaiveDate, SmacrossError> {
    let parsed = match key.split_once('T') {
        None => NaiveDate::parse_from_str(key, "%Y-%m-%d").ok(),
        Some(_) => {
            NaiveDateTime::parse_from_str(key.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .or_else(|_| DateTime::parse_from_rfc3339(key).map(|dt| dt.date_naive()))
                .ok()
        }
    };
    parsed.ok_or_else(|| SmacrossError::Data {
        reason: format!("invalid date key '{}'", key),
    })
}

impl DataPort for JsonAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SmacrossError> {
        let path = self.json_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| SmacrossError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse_document(&content, start_date, end_date).map_err(|e| match e {
            SmacrossError::Data { reason } => SmacrossError::Data {
                reason: format!("{}: {}", path.display(), reason),
            },
            other => other,
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
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".json") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
