#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::error::SmacrossError;
pub use smacross::domain::price_series::{PricePoint, PriceSeries};
use smacross::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SmacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmacrossError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|s| s.slice_dates(start_date, end_date))
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmacrossError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn series_from(start: &str, prices: &[f64]) -> PriceSeries {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint::new(start + chrono::Days::new(i as u64), price))
        .collect();
    PriceSeries::new(points).unwrap()
}

pub fn series(prices: &[f64]) -> PriceSeries {
    series_from("2024-01-01", prices)
}

/// Smooth oscillation with drift; crosses often for short windows.
pub fn wave(n: usize, base: f64) -> PriceSeries {
    let prices: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            base + base * 0.1 * (t * 0.35).sin() + t * 0.05
        })
        .collect();
    series(&prices)
}

pub const SCENARIO: [f64; 5] = [100.0, 110.0, 121.0, 108.9, 119.79];
