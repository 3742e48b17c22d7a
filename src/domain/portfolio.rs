//! Portfolio value simulation.
//!
//! value[0] = initial investment
//! value[i] = value[i-1] * (1 + return[i] * position[i])
//! return[i] = (P[i] - P[i-1]) / P[i-1], and 0 when P[i-1] is zero.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SmacrossError;
use crate::domain::position::{Position, PositionSeries};
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub period_return: f64,
    pub position: Position,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSeries {
    pub initial_investment: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub terminal_value: f64,
}

impl PortfolioSeries {
    pub fn len(&self) -> usize {
        self.equity_curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.value).collect()
    }

    /// terminal / initial - 1, or 0 for a zero investment.
    pub fn total_return(&self) -> f64 {
        if self.initial_investment == 0.0 {
            0.0
        } else {
            self.terminal_value / self.initial_investment - 1.0
        }
    }
}

/// Fractional change from `previous` to `current`. 0 when `previous` is zero
/// or so small that the quotient is not finite.
pub fn period_return(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    let ret = (current - previous) / previous;
    if ret.is_finite() { ret } else { 0.0 }
}

pub fn simulate(
    prices: &PriceSeries,
    positions: &PositionSeries,
    initial_investment: f64,
) -> Result<PortfolioSeries, SmacrossError> {
    if !initial_investment.is_finite() || initial_investment < 0.0 {
        return Err(SmacrossError::invalid_parameter(
            "initial_investment",
            format!("must be finite and non-negative, got {initial_investment}"),
        ));
    }
    prices.ensure_not_empty()?;
    if positions.len() != prices.len() {
        return Err(SmacrossError::invalid_parameter(
            "positions",
            format!(
                "position series has {} points, price series has {}",
                positions.len(),
                prices.len()
            ),
        ));
    }

    let points = prices.points();
    let mut equity_curve = Vec::with_capacity(points.len());
    let mut value = initial_investment;

    for (i, (point, pos)) in points.iter().zip(&positions.points).enumerate() {
        let ret = if i == 0 {
            0.0
        } else {
            period_return(points[i - 1].price, point.price)
        };
        if i > 0 && !pos.effective.is_flat() {
            let next = value * (1.0 + ret * pos.effective.multiplier());
            // an overflowing step leaves the value unchanged
            if next.is_finite() {
                value = next;
            }
        }
        equity_curve.push(EquityPoint {
            date: point.date,
            period_return: ret,
            position: pos.effective,
            value,
        });
    }

    Ok(PortfolioSeries {
        initial_investment,
        equity_curve,
        terminal_value: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::PositionPoint;
    use crate::domain::price_series::PricePoint;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn make_series(prices: &[f64]) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint::new(date((i + 1) as u32), price))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    fn make_positions(effective: &[Position]) -> PositionSeries {
        PositionSeries {
            points: effective
                .iter()
                .enumerate()
                .map(|(i, &effective)| PositionPoint {
                    date: date((i + 1) as u32),
                    raw: Position::Flat,
                    effective,
                })
                .collect(),
        }
    }

    #[test]
    fn period_return_basic() {
        assert_relative_eq!(period_return(100.0, 110.0), 0.1);
        assert_relative_eq!(period_return(100.0, 90.0), -0.1);
        assert_eq!(period_return(0.0, 50.0), 0.0);
    }

    #[test]
    fn flat_positions_keep_initial_value() {
        let prices = make_series(&[100.0, 150.0, 50.0, 75.0]);
        let positions = make_positions(&[Position::Flat; 4]);
        let portfolio = simulate(&prices, &positions, 1000.0).unwrap();

        assert!(portfolio.values().iter().all(|&v| v == 1000.0));
        assert_eq!(portfolio.terminal_value, 1000.0);
        assert_eq!(portfolio.total_return(), 0.0);
    }

    #[test]
    fn long_position_compounds() {
        let prices = make_series(&[100.0, 110.0, 121.0]);
        let positions = make_positions(&[Position::Flat, Position::Long, Position::Long]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();

        assert_relative_eq!(portfolio.equity_curve[1].value, 110.0, epsilon = 1e-9);
        assert_relative_eq!(portfolio.terminal_value, 121.0, epsilon = 1e-9);
        assert_relative_eq!(portfolio.total_return(), 0.21, epsilon = 1e-9);
    }

    #[test]
    fn short_position_gains_on_decline() {
        let prices = make_series(&[100.0, 80.0]);
        let positions = make_positions(&[Position::Flat, Position::Short]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();
        assert_relative_eq!(portfolio.terminal_value, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn first_period_return_is_zero() {
        let prices = make_series(&[100.0, 200.0]);
        let positions = make_positions(&[Position::Long, Position::Flat]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();
        assert_eq!(portfolio.equity_curve[0].period_return, 0.0);
        assert_eq!(portfolio.equity_curve[0].value, 100.0);
    }

    #[test]
    fn zero_price_guard() {
        let prices = make_series(&[100.0, 0.0, 50.0, 60.0]);
        let positions = make_positions(&[Position::Long; 4]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();

        assert!(portfolio.values().iter().all(|v| v.is_finite()));
        // step into zero: -100%
        assert_eq!(portfolio.equity_curve[1].value, 0.0);
        // step out of zero is guarded
        assert_eq!(portfolio.equity_curve[2].period_return, 0.0);
    }

    #[test]
    fn tiny_price_keeps_flat_portfolio_finite() {
        let prices = make_series(&[100.0, 1e-310, 1.0]);
        let positions = make_positions(&[Position::Flat; 3]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();

        assert_eq!(portfolio.values(), vec![100.0, 100.0, 100.0]);
        assert_eq!(portfolio.equity_curve[2].period_return, 0.0);
    }

    #[test]
    fn tiny_price_with_exposure_stays_finite() {
        let prices = make_series(&[100.0, 5e-324, 1.0, 2.0]);
        let positions = make_positions(&[
            Position::Flat,
            Position::Long,
            Position::Short,
            Position::Long,
        ]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();
        assert!(portfolio.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn period_return_non_finite_quotient_is_zero() {
        assert_eq!(period_return(1e-310, 1.0), 0.0);
        assert_eq!(period_return(5e-324, 1e300), 0.0);
    }

    #[test]
    fn zero_price_guard_with_short() {
        let prices = make_series(&[10.0, 0.0, 5.0]);
        let positions = make_positions(&[Position::Flat, Position::Short, Position::Short]);
        let portfolio = simulate(&prices, &positions, 100.0).unwrap();
        assert!(portfolio.values().iter().all(|v| v.is_finite()));
        assert_relative_eq!(portfolio.terminal_value, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_investment_is_allowed() {
        let prices = make_series(&[1.0, 2.0]);
        let positions = make_positions(&[Position::Flat, Position::Long]);
        let portfolio = simulate(&prices, &positions, 0.0).unwrap();
        assert_eq!(portfolio.terminal_value, 0.0);
        assert_eq!(portfolio.total_return(), 0.0);
    }

    #[test]
    fn negative_investment_is_invalid() {
        let prices = make_series(&[1.0, 2.0]);
        let positions = make_positions(&[Position::Flat, Position::Flat]);
        let err = simulate(&prices, &positions, -1.0).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidParameter { ref name, .. } if name == "initial_investment"));
    }

    #[test]
    fn non_finite_investment_is_invalid() {
        let prices = make_series(&[1.0]);
        let positions = make_positions(&[Position::Flat]);
        assert!(simulate(&prices, &positions, f64::NAN).is_err());
        assert!(simulate(&prices, &positions, f64::INFINITY).is_err());
    }

    #[test]
    fn misaligned_positions_are_invalid() {
        let prices = make_series(&[1.0, 2.0, 3.0]);
        let positions = make_positions(&[Position::Flat]);
        assert!(simulate(&prices, &positions, 100.0).is_err());
    }

    #[test]
    fn empty_prices_are_invalid() {
        let positions = make_positions(&[]);
        assert!(simulate(&PriceSeries::default(), &positions, 100.0).is_err());
    }
}
