//! Position model: signals to long/flat/short with a one-period lag.
//!
//! The raw position at period i is +1 on a buy, -1 on a sell and 0 otherwise;
//! it is not held between signals. The effective position applied to the
//! return of period i is the raw position of period i-1, and period 0 is
//! always flat.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::domain::error::SmacrossError;
use crate::domain::signal::{Signal, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn from_signal(signal: Signal) -> Self {
        match signal {
            Signal::Buy => Position::Long,
            Signal::Sell => Position::Short,
            Signal::None => Position::Flat,
        }
    }

    /// -1, 0 or +1.
    pub fn value(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn multiplier(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionPoint {
    pub date: NaiveDate,
    /// Position implied by this period's own signal.
    pub raw: Position,
    /// Position applied to this period's return.
    pub effective: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PositionSeries {
    pub points: Vec<PositionPoint>,
}

impl PositionSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn effective(&self) -> Vec<Position> {
        self.points.iter().map(|p| p.effective).collect()
    }

    pub fn raw(&self) -> Vec<Position> {
        self.points.iter().map(|p| p.raw).collect()
    }

    /// Periods during which a non-flat position was applied.
    pub fn exposed_periods(&self) -> usize {
        self.points
            .iter()
            .filter(|p| !p.effective.is_flat())
            .count()
    }
}

pub fn derive(signals: &SignalSeries) -> Result<PositionSeries, SmacrossError> {
    if signals.is_empty() {
        return Err(SmacrossError::invalid_parameter(
            "signals",
            "signal series is empty",
        ));
    }

    let mut previous_raw = Position::Flat;
    let points = signals
        .points
        .iter()
        .map(|point| {
            let raw = Position::from_signal(point.signal);
            let effective = previous_raw;
            previous_raw = raw;
            PositionPoint {
                date: point.date,
                raw,
                effective,
            }
        })
        .collect();

    Ok(PositionSeries { points })
}
