//! Keltner Channels.
//!
//! - Middle: recursive span-n EMA of the source, gated on n bars
//! - Range: adjusted span-n EWM of the true range, gated on n observations
//! - Upper / Lower: Middle ± multiplier × Range
//!
//! The true range is undefined at bar 0, so the range (and both outer
//! bands) start one bar after the middle line.

use crate::domain::error::StratlabError;
use crate::domain::indicator::ema::{Decay, EwmOptions, ema, ewm};
use crate::domain::indicator_helpers::{Series, check_window, zip_with};
use crate::domain::ohlcv::{PriceField, PriceSeries};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct KeltnerOutput {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn keltner(
    series: &PriceSeries,
    source: PriceField,
    period: usize,
    mult: f64,
) -> Result<KeltnerOutput, StratlabError> {
    if !mult.is_finite() || mult < 0.0 {
        return Err(StratlabError::invalid_parameter(
            "keltner multiplier",
            format!("{mult} must be a non-negative number"),
        ));
    }
    check_window("Keltner", period, series.len())?;

    let middle = ema(&series.field(source), period)?;
    let range = ewm(
        &series.true_ranges(),
        &EwmOptions {
            decay: Decay::Span(period),
            min_periods: period,
            adjust: true,
        },
    )?;
    let upper = zip_with(&middle, &range, |m, r| Some(m + mult * r));
    let lower = zip_with(&middle, &range, |m, r| Some(m - mult * r));

    Ok(KeltnerOutput {
        upper,
        middle,
        lower,
    })
}
