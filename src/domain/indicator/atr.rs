//! Average True Range.
//!
//! TR[i] = max(H - L, |H - C[i-1]|, |L - C[i-1]|), undefined at bar 0.
//! ATR = adjusted EWM of TR with alpha = 1/n, gated on n observations,
//! so the first defined value is at bar n.

use crate::domain::error::StratlabError;
use crate::domain::indicator::ema::{Decay, EwmOptions, ewm};
use crate::domain::indicator_helpers::{Series, check_window};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

pub fn atr(series: &PriceSeries, period: usize) -> Result<Series, StratlabError> {
    check_window("ATR", period + 1, series.len())?;
    ewm(
        &series.true_ranges(),
        &EwmOptions {
            decay: Decay::Alpha(1.0 / period as f64),
            min_periods: period,
            adjust: true,
        },
    )
}
