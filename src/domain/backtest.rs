//! Vectorised backtest: compounds period returns by the lagged position.
//!
//! r[t]   = p[t] / p[t-1] - 1
//! cum[0] = 1.0
//! cum[t] = cum[t-1] * (1 + pos[t-1] * r[t])
//!
//! The position decided at bar t-1 earns the return of bar t. A missing
//! position or return contributes a factor of 1.0; no index is skipped.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, pct_change};
use crate::domain::signal::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Cumulative return, base 1.0, one value per bar.
    pub cumulative: Vec<f64>,
    pub terminal: f64,
}

/// Simple period returns of a price column.
pub fn period_returns(prices: &[f64]) -> Series {
    pct_change(prices)
}

pub fn compound(
    positions: &[Option<Position>],
    prices: &[f64],
) -> Result<BacktestResult, StratlabError> {
    if positions.len() != prices.len() {
        return Err(StratlabError::LengthMismatch {
            expected: prices.len(),
            actual: positions.len(),
        });
    }
    if prices.is_empty() {
        return Err(StratlabError::EmptySeries);
    }

    let returns = period_returns(prices);
    let mut cumulative = Vec::with_capacity(prices.len());
    let mut cum = 1.0;
    cumulative.push(cum);
    for t in 1..prices.len() {
        let factor = match (positions[t - 1], returns[t]) {
            (Some(pos), Some(r)) => 1.0 + pos.direction() * r,
            _ => 1.0,
        };
        cum *= factor;
        cumulative.push(cum);
    }

    Ok(BacktestResult {
        terminal: cum,
        cumulative,
    })
}
