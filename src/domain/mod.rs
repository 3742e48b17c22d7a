//! Core domain types and logic.

pub mod price_series;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod backtest;
pub mod sweep;
pub mod config_validation;
pub mod error;
