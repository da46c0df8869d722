//! Squeeze Momentum.
//!
//! Compares Bollinger Bands (sample deviation) against Keltner Channels:
//! - On: both Bollinger bands sit strictly inside the Keltner channel
//! - Off: both Bollinger bands sit strictly outside the Keltner channel
//! - Neutral: anything else
//!
//! Momentum = SMA(momentum_length) of `close[t] - close[t - momentum_periods]`.

use crate::domain::error::StratlabError;
use crate::domain::indicator::bollinger::bollinger;
use crate::domain::indicator::keltner::keltner;
use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::indicator_helpers::{Series, check_window, diff};
use crate::domain::ohlcv::{PriceField, PriceSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqueezeState {
    On,
    Off,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqueezeParams {
    pub bb_length: usize,
    pub bb_mult: f64,
    pub bb_ddof: usize,
    pub kc_length: usize,
    pub kc_mult: f64,
    pub momentum_periods: usize,
    pub momentum_length: usize,
    pub source: PriceField,
}

impl Default for SqueezeParams {
    fn default() -> Self {
        Self {
            bb_length: 20,
            bb_mult: 2.0,
            bb_ddof: 1,
            kc_length: 20,
            kc_mult: 1.5,
            momentum_periods: 12,
            momentum_length: 6,
            source: PriceField::Close,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqueezeOutput {
    pub momentum: Series,
    pub state: Vec<Option<SqueezeState>>,
}

impl SqueezeOutput {
    /// 1.0 for on, -1.0 for off, 0.0 for neutral.
    pub fn state_codes(&self) -> Series {
        self.state
            .iter()
            .map(|s| {
                s.map(|s| match s {
                    SqueezeState::On => 1.0,
                    SqueezeState::Off => -1.0,
                    SqueezeState::Neutral => 0.0,
                })
            })
            .collect()
    }
}

pub fn squeeze(series: &PriceSeries, params: &SqueezeParams) -> Result<SqueezeOutput, StratlabError> {
    check_window(
        "squeeze momentum",
        params.momentum_periods + params.momentum_length,
        series.len(),
    )?;
    if params.momentum_periods == 0 {
        return Err(StratlabError::invalid_parameter(
            "momentum_periods",
            "must be at least 1",
        ));
    }

    let source = series.field(params.source);
    let bb = bollinger(&source, params.bb_length, params.bb_mult, params.bb_ddof)?;
    let kc = keltner(series, params.source, params.kc_length, params.kc_mult)?;

    let state = (0..series.len())
        .map(|i| {
            let (bb_up, bb_lw, kc_up, kc_lw) = (bb.upper[i]?, bb.lower[i]?, kc.upper[i]?, kc.lower[i]?);
            Some(if bb_lw > kc_lw && bb_up < kc_up {
                SqueezeState::On
            } else if bb_lw < kc_lw && bb_up > kc_up {
                SqueezeState::Off
            } else {
                SqueezeState::Neutral
            })
        })
        .collect();

    let change = diff(&series.closes(), params.momentum_periods);
    let momentum = rolling_mean(&change, params.momentum_length)?;

    Ok(SqueezeOutput { momentum, state })
}
