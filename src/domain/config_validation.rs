//! Configuration validation.
//!
//! Validates config sections before any price data is loaded. Window
//! ordering is only checked for the sweep grid; a single backtest accepts
//! any pair of windows.

use crate::domain::backtest::WarmupMode;
use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: [&str; 2] = ["csv", "json"];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_source(config)?;
    validate_path(config)?;
    Ok(())
}

/// `[data] symbol` is only optional when the caller supplies a symbol itself.
pub fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("data", "symbol") {
        Some(_) => Ok(()),
        None => Err(SmacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_window(config, "short_window")?;
    validate_window(config, "long_window")?;
    validate_initial_investment(config)?;
    validate_dates(config)?;
    validate_warmup(config)?;
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    for key in ["short_windows", "long_windows"] {
        match config.get_list("sweep", key) {
            Some(items) => {
                parse_window_list(&items, key)?;
            }
            None => {
                return Err(SmacrossError::ConfigMissing {
                    section: "sweep".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }
    if let Some(raw) = config.get_string("sweep", "top") {
        match raw.trim().parse::<usize>() {
            Ok(n) if n >= 1 => {}
            _ => {
                return Err(SmacrossError::ConfigInvalid {
                    section: "sweep".to_string(),
                    key: "top".to_string(),
                    reason: "top must be a positive integer".to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Parse a list of window lengths; every item must be an integer >= 1.
pub fn parse_window_list(items: &[String], key: &str) -> Result<Vec<usize>, SmacrossError> {
    if items.is_empty() {
        return Err(SmacrossError::ConfigInvalid {
            section: "sweep".to_string(),
            key: key.to_string(),
            reason: "list is empty".to_string(),
        });
    }
    items
        .iter()
        .map(|item| match item.parse::<usize>() {
            Ok(w) if w >= 1 => Ok(w),
            _ => Err(SmacrossError::ConfigInvalid {
                section: "sweep".to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a window length >= 1", item),
            }),
        })
        .collect()
}

pub fn parse_date(value: &str, section: &str, field: &str) -> Result<NaiveDate, SmacrossError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        SmacrossError::ConfigInvalid {
            section: section.to_string(),
            key: field.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD", field),
        }
    })
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(SmacrossError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{}', expected csv or json", source),
        });
    }
    Ok(())
}

fn validate_path(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("data", "path") {
        Some(_) => Ok(()),
        None => Err(SmacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), SmacrossError> {
    if let Some(raw) = config.get_string("backtest", key) {
        match raw.parse::<i64>() {
            Ok(w) if w >= 1 => {}
            _ => {
                return Err(SmacrossError::ConfigInvalid {
                    section: "backtest".to_string(),
                    key: key.to_string(),
                    reason: format!("{} must be an integer >= 1", key),
                })
            }
        }
    }
    Ok(())
}

fn validate_initial_investment(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if let Some(raw) = config.get_string("backtest", "initial_investment") {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => {
                return Err(SmacrossError::ConfigInvalid {
                    section: "backtest".to_string(),
                    key: "initial_investment".to_string(),
                    reason: "initial_investment must be a non-negative number".to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start = config
        .get_string("backtest", "start_date")
        .map(|s| parse_date(&s, "backtest", "start_date"))
        .transpose()?;
    let end = config
        .get_string("backtest", "end_date")
        .map(|s| parse_date(&s, "backtest", "end_date"))
        .transpose()?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_warmup(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if let Some(raw) = config.get_string("backtest", "warmup") {
        raw.parse::<WarmupMode>()
            .map_err(|reason| SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "warmup".to_string(),
                reason,
            })?;
    }
    Ok(())
}
