//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod optimizer;
pub mod session;
pub mod correlation;
pub mod config_validation;
pub mod error;
