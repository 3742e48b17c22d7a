//! Backtest pipeline.
//!
//! PriceSeries -> SMA x2 -> crossover signals -> lagged positions ->
//! portfolio. Each stage returns a new series; nothing is mutated in place.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::SmacrossError;
use crate::domain::indicator::MovingAverageSeries;
use crate::domain::portfolio::{self, PortfolioSeries};
use crate::domain::position::{self, Position, PositionSeries};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{self, Signal, SignalSeries};

/// How SMAs are warmed up when the backtest is restricted to a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupMode {
    /// Compute SMAs and signals over all history up to `end_date`, then keep
    /// the visible range. SMAs are already defined at `start_date` when
    /// enough earlier data exists.
    #[default]
    FullHistory,
    /// Slice to `[start_date, end_date]` first; the leading points of the
    /// visible range are insufficient history.
    VisibleRange,
}

impl fmt::Display for WarmupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmupMode::FullHistory => write!(f, "full_history"),
            WarmupMode::VisibleRange => write!(f, "visible_range"),
        }
    }
}

impl FromStr for WarmupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full_history" | "full" | "history" => Ok(WarmupMode::FullHistory),
            "visible_range" | "visible" | "range" => Ok(WarmupMode::VisibleRange),
            other => Err(format!(
                "unknown warmup mode '{other}' (expected full_history or visible_range)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub initial_investment: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub warmup: WarmupMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            short_window: 20,
            long_window: 50,
            initial_investment: 10_000.0,
            start_date: None,
            end_date: None,
            warmup: WarmupMode::FullHistory,
        }
    }
}

impl BacktestConfig {
    pub fn with_windows(&self, short_window: usize, long_window: usize) -> Self {
        BacktestConfig {
            short_window,
            long_window,
            ..self.clone()
        }
    }
}

/// One row of the per-period output table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub price: f64,
    pub short_sma: Option<f64>,
    pub long_sma: Option<f64>,
    pub signal: Signal,
    pub position: Position,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub prices: PriceSeries,
    pub short_sma: MovingAverageSeries,
    pub long_sma: MovingAverageSeries,
    pub signals: SignalSeries,
    pub positions: PositionSeries,
    pub portfolio: PortfolioSeries,
    pub terminal_value: f64,
}

impl BacktestResult {
    pub fn total_return(&self) -> f64 {
        self.portfolio.total_return()
    }

    pub fn buy_dates(&self) -> Vec<NaiveDate> {
        self.dates_with(Signal::Buy)
    }

    pub fn sell_dates(&self) -> Vec<NaiveDate> {
        self.dates_with(Signal::Sell)
    }

    pub fn rows(&self) -> Vec<BacktestRow> {
        self.prices
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| BacktestRow {
                date: p.date,
                price: p.price,
                short_sma: self.short_sma.get(i),
                long_sma: self.long_sma.get(i),
                signal: self.signals.points[i].signal,
                position: self.positions.points[i].effective,
                portfolio_value: self.portfolio.equity_curve[i].value,
            })
            .collect()
    }

    fn dates_with(&self, signal: Signal) -> Vec<NaiveDate> {
        self.signals
            .points
            .iter()
            .filter(|p| p.signal == signal)
            .map(|p| p.date)
            .collect()
    }
}

pub fn run_backtest(
    prices: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, SmacrossError> {
    validate(config)?;

    let visible = prices.slice_dates(config.start_date, config.end_date);
    visible.ensure_not_empty().map_err(|_| {
        SmacrossError::invalid_parameter(
            "prices",
            format!(
                "no prices between {} and {}",
                fmt_bound(config.start_date),
                fmt_bound(config.end_date)
            ),
        )
    })?;

    let crossover = match config.warmup {
        WarmupMode::VisibleRange => {
            signal::generate(&visible, config.short_window, config.long_window)?
        }
        WarmupMode::FullHistory => {
            let history = prices.until(config.end_date);
            let full = signal::generate(&history, config.short_window, config.long_window)?;
            signal::Crossover {
                short: full.short.slice_dates(config.start_date, config.end_date),
                long: full.long.slice_dates(config.start_date, config.end_date),
                signals: full.signals.slice_dates(config.start_date, config.end_date),
            }
        }
    };

    let positions = position::derive(&crossover.signals)?;
    let portfolio = portfolio::simulate(&visible, &positions, config.initial_investment)?;
    let terminal_value = portfolio.terminal_value;

    tracing::debug!(
        short_window = config.short_window,
        long_window = config.long_window,
        periods = visible.len(),
        signals = crossover.signals.signal_count(),
        terminal_value,
        "backtest complete"
    );

    Ok(BacktestResult {
        config: config.clone(),
        prices: visible,
        short_sma: crossover.short,
        long_sma: crossover.long,
        signals: crossover.signals,
        positions,
        portfolio,
        terminal_value,
    })
}

fn validate(config: &BacktestConfig) -> Result<(), SmacrossError> {
    if config.short_window < 1 {
        return Err(SmacrossError::invalid_parameter(
            "short_window",
            "window must be at least 1",
        ));
    }
    if config.long_window < 1 {
        return Err(SmacrossError::invalid_parameter(
            "long_window",
            "window must be at least 1",
        ));
    }
    if !config.initial_investment.is_finite() || config.initial_investment < 0.0 {
        return Err(SmacrossError::invalid_parameter(
            "initial_investment",
            format!(
                "must be finite and non-negative, got {}",
                config.initial_investment
            ),
        ));
    }
    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        if start > end {
            return Err(SmacrossError::invalid_parameter(
                "start_date",
                format!("start_date {start} is after end_date {end}"),
            ));
        }
    }
    Ok(())
}

fn fmt_bound(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "(open)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn config(short: usize, long: usize, initial: f64) -> BacktestConfig {
        BacktestConfig {
            short_window: short,
            long_window: long,
            initial_investment: initial,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn default_config() {
        let c = BacktestConfig::default();
        assert_eq!(c.short_window, 20);
        assert_eq!(c.long_window, 50);
        assert_relative_eq!(c.initial_investment, 10_000.0);
        assert_eq!(c.warmup, WarmupMode::FullHistory);
        assert!(c.start_date.is_none());
        assert!(c.end_date.is_none());
    }

    #[test]
    fn with_windows_keeps_other_fields() {
        let base = BacktestConfig {
            start_date: Some(date(3)),
            ..config(1, 2, 50.0)
        };
        let c = base.with_windows(5, 10);
        assert_eq!(c.short_window, 5);
        assert_eq!(c.long_window, 10);
        assert_eq!(c.start_date, Some(date(3)));
        assert_relative_eq!(c.initial_investment, 50.0);
    }

    #[test]
    fn warmup_mode_parse_and_display() {
        assert_eq!("full_history".parse::<WarmupMode>(), Ok(WarmupMode::FullHistory));
        assert_eq!("Visible_Range".parse::<WarmupMode>(), Ok(WarmupMode::VisibleRange));
        assert!("sometimes".parse::<WarmupMode>().is_err());
        assert_eq!(WarmupMode::VisibleRange.to_string(), "visible_range");
    }

    #[test]
    fn known_scenario_terminal_value() {
        let prices = make_series(&[100.0, 110.0, 121.0, 108.9, 119.79]);
        let result = run_backtest(&prices, &config(1, 2, 100.0)).unwrap();

        assert_eq!(result.signals.buy_indices(), vec![4]);
        assert_eq!(result.signals.sell_indices(), vec![3]);
        assert_eq!(result.buy_dates(), vec![date(5)]);
        assert_eq!(result.sell_dates(), vec![date(4)]);
        // sell at 3 becomes a short applied to the +10% move of period 4
        assert_relative_eq!(result.terminal_value, 90.0, epsilon = 1e-9);
        assert_relative_eq!(result.total_return(), -0.1, epsilon = 1e-9);
    }

    #[test]
    fn rows_are_aligned() {
        let prices = make_series(&[100.0, 110.0, 121.0, 108.9, 119.79]);
        let result = run_backtest(&prices, &config(1, 2, 100.0)).unwrap();
        let rows = result.rows();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].long_sma, None);
        assert_relative_eq!(rows[1].long_sma.unwrap(), 105.0);
        assert_eq!(rows[3].signal, Signal::Sell);
        assert_eq!(rows[4].position, Position::Short);
        assert_relative_eq!(rows[4].portfolio_value, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn full_history_warms_up_before_start() {
        let prices = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let c = BacktestConfig {
            start_date: Some(date(4)),
            ..config(1, 3, 100.0)
        };
        let result = run_backtest(&prices, &c).unwrap();

        assert_eq!(result.prices.len(), 3);
        assert_eq!(result.long_sma.len(), 3);
        assert_relative_eq!(result.long_sma.get(0).unwrap(), 3.0);
    }

    #[test]
    fn visible_range_recomputes_from_start() {
        let prices = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let c = BacktestConfig {
            start_date: Some(date(4)),
            warmup: WarmupMode::VisibleRange,
            ..config(1, 3, 100.0)
        };
        let result = run_backtest(&prices, &c).unwrap();

        assert_eq!(result.long_sma.get(0), None);
        assert_eq!(result.long_sma.get(1), None);
        assert_relative_eq!(result.long_sma.get(2).unwrap(), 5.0);
    }

    #[test]
    fn full_history_can_signal_on_first_visible_day() {
        // short crosses above long on day 4
        let prices = make_series(&[5.0, 5.0, 4.0, 9.0, 9.0]);
        let full = BacktestConfig {
            start_date: Some(date(4)),
            ..config(1, 2, 100.0)
        };
        let visible = BacktestConfig {
            warmup: WarmupMode::VisibleRange,
            ..full.clone()
        };

        let a = run_backtest(&prices, &full).unwrap();
        let b = run_backtest(&prices, &visible).unwrap();
        assert_eq!(a.signals.buy_indices(), vec![0]);
        assert!(b.signals.buy_indices().is_empty());
        // portfolio always starts flat on the first visible day
        assert_eq!(a.positions.points[0].effective, Position::Flat);
        assert_eq!(a.positions.points[1].effective, Position::Long);
    }

    #[test]
    fn end_date_excludes_later_prices() {
        let prices = make_series(&[1.0, 2.0, 3.0, 4.0]);
        let c = BacktestConfig {
            end_date: Some(date(2)),
            ..config(1, 2, 100.0)
        };
        let result = run_backtest(&prices, &c).unwrap();
        assert_eq!(result.prices.len(), 2);
        assert_eq!(result.portfolio.len(), 2);
    }

    #[test]
    fn empty_range_is_invalid() {
        let prices = make_series(&[1.0, 2.0]);
        let c = BacktestConfig {
            start_date: Some(date(20)),
            ..config(1, 2, 100.0)
        };
        let err = run_backtest(&prices, &c).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidParameter { .. }));
    }

    #[test]
    fn reversed_range_is_invalid() {
        let prices = make_series(&[1.0, 2.0]);
        let c = BacktestConfig {
            start_date: Some(date(2)),
            end_date: Some(date(1)),
            ..config(1, 2, 100.0)
        };
        assert!(run_backtest(&prices, &c).is_err());
    }

    #[test]
    fn invalid_windows_fail_fast() {
        let prices = make_series(&[1.0, 2.0]);
        assert!(run_backtest(&prices, &config(0, 2, 100.0)).is_err());
        assert!(run_backtest(&prices, &config(1, 0, 100.0)).is_err());
    }

    #[test]
    fn negative_investment_fails_fast() {
        let prices = make_series(&[1.0, 2.0]);
        let err = run_backtest(&prices, &config(1, 2, -5.0)).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidParameter { .. }));
    }

    #[test]
    fn empty_series_is_invalid() {
        assert!(run_backtest(&PriceSeries::default(), &config(1, 2, 100.0)).is_err());
    }

    #[test]
    fn short_longer_than_long_is_accepted() {
        let prices = make_series(&[1.0, 3.0, 2.0, 4.0, 1.0]);
        let result = run_backtest(&prices, &config(3, 1, 100.0)).unwrap();
        assert_eq!(result.config.short_window, 3);
        assert_eq!(result.prices.len(), 5);
    }
}
