//! Directional Movement Index (+DI, -DI, ADX).
//!
//! Directional moves for bar i:
//!   up = H[i] - H[i-1], down = L[i-1] - L[i]
//!   +DM = up if up > down and up > 0, else 0
//!   -DM = down if down > up and down > 0, else 0
//!
//! Smoothing is Wilder's running sum with `factor = 1 - 1/n`
//! (n = `di_smoothing`), seeded with the plain sums over bars 1..=n:
//!   S[i] = S[i-1] * factor + x[i]
//!
//! +DI = 100 * S(+DM) / S(TR), -DI = 100 * S(-DM) / S(TR)
//! DX  = 100 * |+DI - -DI| / (+DI + -DI)
//! ADX is seeded with the mean of the first `adx_length` defined DX values
//! and then Wilder-averaged: ADX[i] = (ADX[i-1] * (m-1) + DX[i]) / m.
//!
//! Warmup: DI lines from bar n, ADX from bar n + m - 1.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, check_window, checked_div};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_DI_SMOOTHING: usize = 14;
pub const DEFAULT_ADX_LENGTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmiParams {
    /// Wilder smoothing length for TR and directional moves.
    pub di_smoothing: usize,
    /// Averaging length for ADX.
    pub adx_length: usize,
}

impl Default for DmiParams {
    fn default() -> Self {
        Self {
            di_smoothing: DEFAULT_DI_SMOOTHING,
            adx_length: DEFAULT_ADX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DmiOutput {
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
}

/// Running ADX average over defined DX values.
#[derive(Debug, Default)]
struct AdxState {
    seen: usize,
    sum: f64,
    adx: Option<f64>,
}

impl AdxState {
    fn push(&mut self, dx: f64, length: usize) -> Option<f64> {
        match self.adx {
            Some(prev) => {
                let next = (prev * (length - 1) as f64 + dx) / length as f64;
                self.adx = Some(next);
            }
            None => {
                self.seen += 1;
                self.sum += dx;
                if self.seen == length {
                    self.adx = Some(self.sum / length as f64);
                }
            }
        }
        self.adx
    }
}

pub fn dmi(series: &PriceSeries, params: &DmiParams) -> Result<DmiOutput, StratlabError> {
    let n = params.di_smoothing;
    let m = params.adx_length;
    if n == 0 {
        return Err(StratlabError::invalid_parameter(
            "di_smoothing",
            "must be at least 1",
        ));
    }
    if m == 0 {
        return Err(StratlabError::invalid_parameter(
            "adx_length",
            "must be at least 1",
        ));
    }
    check_window("DMI", n + 1, series.len())?;

    let bars = series.bars();
    let len = bars.len();
    let tr = series.true_ranges();
    let factor = 1.0 - 1.0 / n as f64;

    let mut plus_di = vec![None; len];
    let mut minus_di = vec![None; len];
    let mut adx = vec![None; len];

    let mut tr_sum = 0.0;
    let mut plus_sum = 0.0;
    let mut minus_sum = 0.0;
    let mut adx_state = AdxState::default();

    for i in 1..len {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };
        let tr_i = tr[i].unwrap_or(0.0);

        if i <= n {
            tr_sum += tr_i;
            plus_sum += plus_dm;
            minus_sum += minus_dm;
            if i < n {
                continue;
            }
        } else {
            tr_sum = tr_sum * factor + tr_i;
            plus_sum = plus_sum * factor + plus_dm;
            minus_sum = minus_sum * factor + minus_dm;
        }

        let pdi = checked_div(plus_sum, tr_sum).map(|v| v * 100.0);
        let mdi = checked_div(minus_sum, tr_sum).map(|v| v * 100.0);
        plus_di[i] = pdi;
        minus_di[i] = mdi;

        let dx = match (pdi, mdi) {
            (Some(p), Some(q)) => checked_div((p - q).abs(), p + q).map(|v| v * 100.0),
            _ => None,
        };
        if let Some(dx) = dx {
            adx[i] = adx_state.push(dx, m);
        }
    }

    Ok(DmiOutput {
        plus_di,
        minus_di,
        adx,
    })
}
