//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(P[i-n+1..=i])
//! Warmup: first (n-1) points are `None`.

use crate::domain::error::SmacrossError;
use crate::domain::indicator::{IndicatorPoint, MovingAverageSeries};
use crate::domain::price_series::PriceSeries;

pub fn calculate_sma(
    prices: &PriceSeries,
    window: usize,
) -> Result<MovingAverageSeries, SmacrossError> {
    if window < 1 {
        return Err(SmacrossError::invalid_parameter(
            "window",
            "window must be at least 1",
        ));
    }
    prices.ensure_not_empty()?;

    let closes = prices.prices();
    let divisor = window as f64;
    let mut values = Vec::with_capacity(closes.len());

    for (i, point) in prices.points().iter().enumerate() {
        let value = if i + 1 >= window {
            let sum: f64 = closes[i + 1 - window..=i].iter().sum();
            Some(sum / divisor)
        } else {
            None
        };
        values.push(IndicatorPoint {
            date: point.date,
            value,
        });
    }

    Ok(MovingAverageSeries { window, values })
}
