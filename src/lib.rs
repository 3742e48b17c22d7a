//! smacross: moving-average crossover backtester.
//!
//! Hexagonal architecture: the pure signal and backtest engine lives in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
