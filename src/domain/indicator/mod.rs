//! Technical indicator implementations.
//!
//! Every indicator is a pure function from price data and parameters to one
//! or more `Series` aligned 1:1 with the input bars. Warm-up prefixes and
//! divisions by zero are `None`.
//!
//! Strategies label the outputs they keep with an [`IndicatorType`] so that
//! reports can name columns after the indicator and its parameters.

pub mod atr;
pub mod bollinger;
pub mod chop_zone;
pub mod dmi;
pub mod ema;
pub mod keltner;
pub mod macd;
pub mod parabolic_sar;
pub mod rolling;
pub mod rsi;
pub mod squeeze;
pub mod turtle;
pub mod wma;

use crate::domain::indicator_helpers::Series;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Dmi {
        di_smoothing: usize,
        adx_length: usize,
    },
    Squeeze {
        bb_length: usize,
        kc_length: usize,
        momentum_periods: usize,
        momentum_length: usize,
    },
    ChopZone {
        length: usize,
        ema_length: usize,
    },
}

/// Multiplier in the integer form `IndicatorType` keys on.
pub fn mult_x100(mult: f64) -> u32 {
    (mult * 100.0).round().max(0.0) as u32
}

/// One named output of an indicator, e.g. the signal line of a MACD.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub output: &'static str,
    pub values: Series,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, output: &'static str, values: Series) -> Self {
        Self {
            indicator_type,
            output,
            values,
        }
    }

    /// `TYPE(params).output` column label.
    pub fn label(&self) -> String {
        format!("{}.{}", self.indicator_type, self.output)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Dmi {
                di_smoothing,
                adx_length,
            } => write!(f, "DMI({},{})", di_smoothing, adx_length),
            IndicatorType::Squeeze {
                bb_length,
                kc_length,
                momentum_periods,
                momentum_length,
            } => write!(
                f,
                "SQUEEZE({},{},{},{})",
                bb_length, kc_length, momentum_periods, momentum_length
            ),
            IndicatorType::ChopZone { length, ema_length } => {
                write!(f, "CHOP_ZONE({},{})", length, ema_length)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rsi() {
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
    }

    #[test]
    fn display_bollinger_fractional_mult() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: mult_x100(2.5),
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2.5)");
    }

    #[test]
    fn display_squeeze() {
        let sq = IndicatorType::Squeeze {
            bb_length: 20,
            kc_length: 20,
            momentum_periods: 12,
            momentum_length: 6,
        };
        assert_eq!(sq.to_string(), "SQUEEZE(20,20,12,6)");
    }

    #[test]
    fn series_label() {
        let s = IndicatorSeries::new(
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            "signal",
            vec![None],
        );
        assert_eq!(s.label(), "MACD(12,26,9).signal");
    }

    #[test]
    fn chop_zone_label() {
        let s = IndicatorSeries::new(
            IndicatorType::ChopZone {
                length: 30,
                ema_length: 34,
            },
            "zone",
            vec![],
        );
        assert_eq!(s.label(), "CHOP_ZONE(30,34).zone");
    }
}
