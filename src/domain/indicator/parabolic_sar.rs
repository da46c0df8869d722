//! Parabolic SAR.
//!
//! A sequential scan over the bars carrying `SarState`. The scan starts at
//! bar 2 with the close of bar 1 as the previous SAR, an uptrend, both
//! extremes seeded from bar 0, and the acceleration factor at `increment`.
//!
//! Uptrend step:   sar = prev + af * (extreme_high - prev)
//!   reversal if low < sar: sar = extreme_high, extreme_low = low, af reset
//!   else: new high raises extreme_high and af (capped at max_step);
//!         sar is clamped to the lows of the two previous bars.
//! Downtrend is the mirror image.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, check_window};
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};

pub const DEFAULT_INCREMENT: f64 = 0.02;
pub const DEFAULT_MAX_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarState {
    pub up_trend: bool,
    pub extreme_high: f64,
    pub extreme_low: f64,
    pub acceleration: f64,
    pub sar: f64,
}

impl SarState {
    fn seed(first: &OhlcvBar, second: &OhlcvBar, increment: f64) -> Self {
        Self {
            up_trend: true,
            extreme_high: first.high,
            extreme_low: first.low,
            acceleration: increment,
            sar: second.close,
        }
    }

    /// Advance one bar given the two bars before it.
    fn step(&mut self, bar: &OhlcvBar, prev1: &OhlcvBar, prev2: &OhlcvBar, increment: f64, max_step: f64) {
        let prev = self.sar;
        let mut reversal = false;

        if self.up_trend {
            let mut sar = prev + self.acceleration * (self.extreme_high - prev);
            if bar.low < sar {
                reversal = true;
                sar = self.extreme_high;
                self.extreme_low = bar.low;
                self.acceleration = increment;
            } else {
                if bar.high > self.extreme_high {
                    self.extreme_high = bar.high;
                    self.acceleration = (self.acceleration + increment).min(max_step);
                }
                if prev2.low < sar {
                    sar = prev2.low;
                } else if prev1.low < sar {
                    sar = prev1.low;
                }
            }
            self.sar = sar;
        } else {
            let mut sar = prev - self.acceleration * (prev - self.extreme_low);
            if bar.high > sar {
                reversal = true;
                sar = self.extreme_low;
                self.extreme_high = bar.high;
                self.acceleration = increment;
            } else {
                if bar.low < self.extreme_low {
                    self.extreme_low = bar.low;
                    self.acceleration = (self.acceleration + increment).min(max_step);
                }
                if prev2.high > sar {
                    sar = prev2.high;
                } else if prev1.high > sar {
                    sar = prev1.high;
                }
            }
            self.sar = sar;
        }

        self.up_trend = self.up_trend != reversal;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SarOutput {
    pub sar: Series,
    /// SAR while in an uptrend, undefined otherwise.
    pub up: Series,
    /// SAR while in a downtrend, undefined otherwise.
    pub down: Series,
}

pub fn parabolic_sar(
    series: &PriceSeries,
    increment: f64,
    max_step: f64,
) -> Result<SarOutput, StratlabError> {
    if !(increment > 0.0 && increment <= max_step && max_step.is_finite()) {
        return Err(StratlabError::invalid_parameter(
            "parabolic SAR step",
            format!("need 0 < increment ({increment}) <= max step ({max_step})"),
        ));
    }
    check_window("Parabolic SAR", 3, series.len())?;

    let bars = series.bars();
    let len = bars.len();
    let mut sar = vec![None; len];
    let mut up = vec![None; len];
    let mut down = vec![None; len];

    let mut state = SarState::seed(&bars[0], &bars[1], increment);
    for i in 2..len {
        state.step(&bars[i], &bars[i - 1], &bars[i - 2], increment, max_step);
        sar[i] = Some(state.sar);
        if state.up_trend {
            up[i] = Some(state.sar);
        } else {
            down[i] = Some(state.sar);
        }
    }

    Ok(SarOutput { sar, up, down })
}
