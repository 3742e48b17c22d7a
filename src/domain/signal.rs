//! Crossover signal generation.
//!
//! A buy fires on the period where the short SMA moves from at-or-below the
//! long SMA to strictly above it; a sell on the symmetric downward move. Both
//! SMAs must be defined at the current and the previous index, so index 0 and
//! the warmup region never signal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SmacrossError;
use crate::domain::indicator::MovingAverageSeries;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::price_series::PriceSeries;

/// Signal observed at a single period. Buy and sell are exclusive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn buy(&self) -> Vec<bool> {
        self.points.iter().map(|p| p.signal == Signal::Buy).collect()
    }

    pub fn sell(&self) -> Vec<bool> {
        self.points.iter().map(|p| p.signal == Signal::Sell).collect()
    }

    pub fn buy_indices(&self) -> Vec<usize> {
        self.indices_of(Signal::Buy)
    }

    pub fn sell_indices(&self) -> Vec<usize> {
        self.indices_of(Signal::Sell)
    }

    /// Number of buy plus sell signals.
    pub fn signal_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.signal != Signal::None)
            .count()
    }

    pub fn slice_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        SignalSeries {
            points: self
                .points
                .iter()
                .filter(|p| start.is_none_or(|s| p.date >= s))
                .filter(|p| end.is_none_or(|e| p.date <= e))
                .copied()
                .collect(),
        }
    }

    fn indices_of(&self, signal: Signal) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.signal == signal)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Short SMA, long SMA and the signals derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossover {
    pub short: MovingAverageSeries,
    pub long: MovingAverageSeries,
    pub signals: SignalSeries,
}

/// Compute both SMAs and their crossover signals.
///
/// Window order is not enforced: `short_window` may equal or exceed
/// `long_window`.
pub fn generate(
    prices: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<Crossover, SmacrossError> {
    let short = calculate_sma(prices, short_window)?;
    let long = calculate_sma(prices, long_window)?;
    let signals = detect_crossovers(&short, &long)?;

    tracing::trace!(
        short_window,
        long_window,
        buys = signals.buy_indices().len(),
        sells = signals.sell_indices().len(),
        "crossover signals generated"
    );

    Ok(Crossover {
        short,
        long,
        signals,
    })
}

/// Derive signals from two aligned moving-average series.
pub fn detect_crossovers(
    short: &MovingAverageSeries,
    long: &MovingAverageSeries,
) -> Result<SignalSeries, SmacrossError> {
    if short.len() != long.len() {
        return Err(SmacrossError::invalid_parameter(
            "long",
            format!(
                "moving averages are not aligned: {} vs {} points",
                short.len(),
                long.len()
            ),
        ));
    }

    let points = short
        .values
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let signal = if i == 0 {
                Signal::None
            } else {
                classify(
                    (short.get(i - 1), long.get(i - 1)),
                    (short.get(i), long.get(i)),
                )
            };
            SignalPoint {
                date: point.date,
                signal,
            }
        })
        .collect();

    Ok(SignalSeries { points })
}

fn classify(prev: (Option<f64>, Option<f64>), curr: (Option<f64>, Option<f64>)) -> Signal {
    match (prev, curr) {
        ((Some(prev_s), Some(prev_l)), (Some(s), Some(l))) => {
            if s > l && prev_s <= prev_l {
                Signal::Buy
            } else if s < l && prev_s >= prev_l {
                Signal::Sell
            } else {
                Signal::None
            }
        }
        _ => Signal::None,
    }
}
