//! Parameter sweep over (short, long) window pairs.
//!
//! Runs the backtest pipeline once per pair in parallel. Workers share the
//! price series read-only. The window-ordering policy lives here, not in the
//! engine: unless `allow_unordered` is set, pairs with `short >= long` are
//! skipped.

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::error::SmacrossError;
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    pub allow_unordered: bool,
}

impl SweepGrid {
    pub fn new(short_windows: Vec<usize>, long_windows: Vec<usize>) -> Self {
        SweepGrid {
            short_windows,
            long_windows,
            allow_unordered: false,
        }
    }

    pub fn with_unordered(mut self, allow: bool) -> Self {
        self.allow_unordered = allow;
        self
    }

    /// Candidate pairs in grid order. Repeated windows are listed once.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let shorts = unique(&self.short_windows);
        let longs = unique(&self.long_windows);
        let mut pairs = Vec::with_capacity(shorts.len() * longs.len());
        for &short in &shorts {
            for &long in &longs {
                if !self.allow_unordered && short >= long {
                    tracing::debug!(short, long, "skipping pair: short window not below long");
                    continue;
                }
                pairs.push((short, long));
            }
        }
        pairs
    }

    pub fn validate(&self) -> Result<(), SmacrossError> {
        if self.short_windows.is_empty() {
            return Err(SmacrossError::invalid_parameter(
                "short_windows",
                "no short windows to sweep",
            ));
        }
        if self.long_windows.is_empty() {
            return Err(SmacrossError::invalid_parameter(
                "long_windows",
                "no long windows to sweep",
            ));
        }
        if self.short_windows.contains(&0) {
            return Err(SmacrossError::invalid_parameter(
                "short_windows",
                "window must be at least 1",
            ));
        }
        if self.long_windows.contains(&0) {
            return Err(SmacrossError::invalid_parameter(
                "long_windows",
                "window must be at least 1",
            ));
        }
        if self.pairs().is_empty() {
            return Err(SmacrossError::invalid_parameter(
                "long_windows",
                "no pair has short window below long window",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepEntry {
    pub short_window: usize,
    pub long_window: usize,
    pub terminal_value: f64,
    pub total_return: f64,
    pub trades: usize,
}

/// Sweep entries ranked by terminal value, best first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    fn new(mut entries: Vec<SweepEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.terminal_value
                .total_cmp(&a.terminal_value)
                .then(a.short_window.cmp(&b.short_window))
                .then(a.long_window.cmp(&b.long_window))
        });
        SweepResults { entries }
    }

    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }

    pub fn top(&self, n: usize) -> &[SweepEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Distinct windows in first-seen order.
fn unique(windows: &[usize]) -> Vec<usize> {
    let mut seen = Vec::with_capacity(windows.len());
    for &w in windows {
        if !seen.contains(&w) {
            seen.push(w);
        }
    }
    seen
}

pub fn run_sweep(
    prices: &PriceSeries,
    grid: &SweepGrid,
    base: &BacktestConfig,
) -> Result<SweepResults, SmacrossError> {
    grid.validate()?;
    let pairs = grid.pairs();
    let skipped =
        unique(&grid.short_windows).len() * unique(&grid.long_windows).len() - pairs.len();
    if skipped > 0 {
        tracing::warn!(skipped, "skipped pairs whose short window is not below the long window");
    }
    tracing::info!(pairs = pairs.len(), "running parameter sweep");

    let entries = pairs
        .par_iter()
        .map(|&(short, long)| {
            let result = run_backtest(prices, &base.with_windows(short, long))?;
            Ok(SweepEntry {
                short_window: short,
                long_window: long,
                terminal_value: result.terminal_value,
                total_return: result.total_return(),
                trades: result.signals.signal_count(),
            })
        })
        .collect::<Result<Vec<_>, SmacrossError>>()?;

    Ok(SweepResults::new(entries))
}
