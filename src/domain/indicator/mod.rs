//! Moving-average indicator types.
//!
//! - `IndicatorPoint`: one point of an indicator series; `value` is `None`
//!   while the window has insufficient history
//! - `MovingAverageSeries`: a trailing SMA aligned index-for-index with its
//!   source `PriceSeries`

pub mod sma;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverageSeries {
    pub window: usize,
    pub values: Vec<IndicatorPoint>,
}

impl MovingAverageSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    /// Index of the first defined value, if any.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(IndicatorPoint::is_valid)
    }

    /// Keep only the points whose date falls in `[start, end]`.
    pub fn slice_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        MovingAverageSeries {
            window: self.window,
            values: self
                .values
                .iter()
                .filter(|p| start.is_none_or(|s| p.date >= s))
                .filter(|p| end.is_none_or(|e| p.date <= e))
                .copied()
                .collect(),
        }
    }
}

impl fmt::Display for MovingAverageSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA({})", self.window)
    }
}
