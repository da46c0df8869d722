//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three averages are recursive span EMAs gated on their span.
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars

use crate::domain::error::StratlabError;
use crate::domain::indicator::ema::{EwmOptions, ema, ewm};
use crate::domain::indicator_helpers::{Series, check_window, zip_with};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdOutput, StratlabError> {
    check_window("MACD fast", fast, values.len())?;
    check_window("MACD slow", slow, values.len())?;
    check_window("MACD signal", signal_period, values.len())?;

    let fast_ema = ema(values, fast)?;
    let slow_ema = ema(values, slow)?;
    let line = zip_with(&fast_ema, &slow_ema, |f, s| Some(f - s));
    let signal = ewm(&line, &EwmOptions::recursive_span(signal_period))?;
    let histogram = zip_with(&line, &signal, |l, s| Some(l - s));

    Ok(MacdOutput {
        line,
        signal,
        histogram,
    })
}
