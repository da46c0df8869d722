//! MACD + RSI + Bollinger mean-reversion strategy.
//!
//! Long:  MACD > signal, RSI < 50 and close below the Bollinger middle.
//! Short: MACD < signal, RSI > 50 and close above the Bollinger middle.
//!
//! Positions are carried forward: a flat bar keeps the previous non-flat
//! position. The latest signal reads the raw (uncarried) last bar.

use crate::domain::error::StratlabError;
use crate::domain::indicator::bollinger::bollinger;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW, macd};
use crate::domain::indicator::rsi::rsi;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, mult_x100};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::{Operand, Rule, SignalRules, carry_forward, latest_trend, translate};
use crate::domain::strategy::{Evaluation, SearchSpace, Strategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiParams {
    pub length: usize,
    pub source: PriceField,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub length: usize,
    pub mult: f64,
    pub ddof: usize,
    pub source: PriceField,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub source: PriceField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdRsiBollingerParams {
    pub rsi: RsiParams,
    pub bollinger: BollingerParams,
    pub macd: MacdParams,
}

impl Default for MacdRsiBollingerParams {
    fn default() -> Self {
        Self {
            rsi: RsiParams {
                length: 14,
                source: PriceField::Close,
            },
            bollinger: BollingerParams {
                length: 20,
                mult: 2.0,
                ddof: 0,
                source: PriceField::Close,
            },
            macd: MacdParams {
                fast: DEFAULT_FAST,
                slow: DEFAULT_SLOW,
                signal: DEFAULT_SIGNAL,
                source: PriceField::Close,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacdRsiBollingerStrategy {
    params: MacdRsiBollingerParams,
}

impl MacdRsiBollingerStrategy {
    pub fn new(params: MacdRsiBollingerParams) -> Self {
        Self { params }
    }
}

impl Strategy for MacdRsiBollingerStrategy {
    type Params = MacdRsiBollingerParams;
    type Grid = MacdRsiBollingerGrid;

    fn name(&self) -> &'static str {
        "macd-rsi-bollinger"
    }

    fn params(&self) -> &MacdRsiBollingerParams {
        &self.params
    }

    fn with_params(&self, params: MacdRsiBollingerParams) -> Self {
        Self::new(params)
    }

    fn calculate(&self, series: &PriceSeries) -> Result<Evaluation, StratlabError> {
        let p = &self.params;
        let rsi_values = rsi(&series.field(p.rsi.source), p.rsi.length)?;
        let bands = bollinger(
            &series.field(p.bollinger.source),
            p.bollinger.length,
            p.bollinger.mult,
            p.bollinger.ddof,
        )?;
        let m = macd(
            &series.field(p.macd.source),
            p.macd.fast,
            p.macd.slow,
            p.macd.signal,
        )?;
        let closes = series.closes();

        let line = Operand::Series(&m.line);
        let signal_line = Operand::Series(&m.signal);
        let strength = Operand::Series(&rsi_values);
        let midpoint = Operand::Constant(50.0);
        let close = Operand::Prices(&closes);
        let middle = Operand::Series(&bands.middle);

        let rules = SignalRules {
            long: Rule::And(vec![
                Rule::Above {
                    left: line,
                    right: signal_line,
                },
                Rule::Below {
                    left: strength,
                    right: midpoint,
                },
                Rule::Below {
                    left: close,
                    right: middle,
                },
            ]),
            short: Rule::And(vec![
                Rule::Below {
                    left: line,
                    right: signal_line,
                },
                Rule::Above {
                    left: strength,
                    right: midpoint,
                },
                Rule::Above {
                    left: close,
                    right: middle,
                },
            ]),
        };
        let raw = translate(&rules, series.len());
        let signal = latest_trend(&raw);
        let positions = carry_forward(&raw);

        let bb_type = IndicatorType::Bollinger {
            period: p.bollinger.length,
            stddev_mult_x100: mult_x100(p.bollinger.mult),
        };
        let macd_type = IndicatorType::Macd {
            fast: p.macd.fast,
            slow: p.macd.slow,
            signal: p.macd.signal,
        };
        Ok(Evaluation {
            indicators: vec![
                IndicatorSeries::new(IndicatorType::Rsi(p.rsi.length), "value", rsi_values),
                IndicatorSeries::new(bb_type.clone(), "upper", bands.upper),
                IndicatorSeries::new(bb_type.clone(), "middle", bands.middle),
                IndicatorSeries::new(bb_type, "lower", bands.lower),
                IndicatorSeries::new(macd_type.clone(), "line", m.line),
                IndicatorSeries::new(macd_type.clone(), "signal", m.signal),
                IndicatorSeries::new(macd_type, "histogram", m.histogram),
            ],
            positions,
            signal,
            returns_field: PriceField::Close,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacdRsiBollingerGrid {
    pub rsi_length: Vec<usize>,
    pub bb_length: Vec<usize>,
    pub macd_fast: Vec<usize>,
    pub macd_slow: Vec<usize>,
    pub macd_signal: Vec<usize>,
}

impl SearchSpace for MacdRsiBollingerGrid {
    type Params = MacdRsiBollingerParams;

    fn axis_names(&self) -> Vec<&'static str> {
        vec!["rsi_length", "bb_length", "macd_fast", "macd_slow", "macd_signal"]
    }

    fn axes(&self) -> Vec<&[usize]> {
        vec![
            self.rsi_length.as_slice(),
            self.bb_length.as_slice(),
            self.macd_fast.as_slice(),
            self.macd_slow.as_slice(),
            self.macd_signal.as_slice(),
        ]
    }

    fn params_at(&self, base: &MacdRsiBollingerParams, digits: &[usize]) -> MacdRsiBollingerParams {
        let mut params = base.clone();
        params.rsi.length = self.rsi_length[digits[0]];
        params.bollinger.length = self.bb_length[digits[1]];
        params.macd.fast = self.macd_fast[digits[2]];
        params.macd.slow = self.macd_slow[digits[3]];
        params.macd.signal = self.macd_signal[digits[4]];
        params
    }
}
