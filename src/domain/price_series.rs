//! Date-indexed daily price series.
//!
//! A `PriceSeries` is immutable once built: strictly increasing dates, finite
//! non-negative prices. Every derived series in the engine is aligned with it
//! index-for-index.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SmacrossError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        PricePoint { date, price }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points already in date order.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SmacrossError> {
        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price < 0.0 {
                return Err(SmacrossError::invalid_parameter(
                    "prices",
                    format!(
                        "price on {} must be finite and non-negative, got {}",
                        point.date, point.price
                    ),
                ));
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(SmacrossError::invalid_parameter(
                    "prices",
                    format!(
                        "dates must be strictly increasing: {} follows {}",
                        point.date,
                        points[i - 1].date
                    ),
                ));
            }
        }
        Ok(PriceSeries { points })
    }

    /// Sort by date, then validate as [`PriceSeries::new`]. Duplicate dates
    /// are still rejected.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Result<Self, SmacrossError> {
        points.sort_by_key(|p| p.date);
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Inclusive date-range filter. `None` leaves that side open.
    pub fn slice_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceSeries {
        let points = self
            .points
            .iter()
            .filter(|p| start.is_none_or(|s| p.date >= s))
            .filter(|p| end.is_none_or(|e| p.date <= e))
            .copied()
            .collect();
        PriceSeries { points }
    }

    /// Everything up to and including `end`.
    pub fn until(&self, end: Option<NaiveDate>) -> PriceSeries {
        self.slice_dates(None, end)
    }

    /// Fail with `InvalidParameter` when the series has no points.
    pub fn ensure_not_empty(&self) -> Result<(), SmacrossError> {
        if self.is_empty() {
            return Err(SmacrossError::invalid_parameter(
                "prices",
                "price series is empty",
            ));
        }
        Ok(())
    }
}
