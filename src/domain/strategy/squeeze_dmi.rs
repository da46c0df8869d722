//! Squeeze Momentum strategy with optional DMI confirmation.
//!
//! With DMI:    long  when +DI > -DI and momentum > 0,
//!              short when +DI < -DI and momentum < 0.
//! Without DMI: the momentum sign alone decides.
//!
//! The latest signal follows the last position, except without DMI where
//! a momentum of exactly zero still reads as bullish.

use crate::domain::error::StratlabError;
use crate::domain::indicator::dmi::{DmiParams, dmi};
use crate::domain::indicator::squeeze::{SqueezeParams, squeeze};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::{Operand, Rule, SignalRules, Trend, latest_trend, translate};
use crate::domain::strategy::{Evaluation, SearchSpace, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct SqueezeDmiParams {
    pub use_dmi: bool,
    pub dmi: DmiParams,
    pub squeeze: SqueezeParams,
}

impl Default for SqueezeDmiParams {
    fn default() -> Self {
        Self {
            use_dmi: true,
            dmi: DmiParams::default(),
            squeeze: SqueezeParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqueezeDmiStrategy {
    params: SqueezeDmiParams,
}

impl SqueezeDmiStrategy {
    pub fn new(params: SqueezeDmiParams) -> Self {
        Self { params }
    }
}

impl Strategy for SqueezeDmiStrategy {
    type Params = SqueezeDmiParams;
    type Grid = SqueezeDmiGrid;

    fn name(&self) -> &'static str {
        "squeeze-dmi"
    }

    fn params(&self) -> &SqueezeDmiParams {
        &self.params
    }

    fn with_params(&self, params: SqueezeDmiParams) -> Self {
        Self::new(params)
    }

    fn calculate(&self, series: &PriceSeries) -> Result<Evaluation, StratlabError> {
        let p = &self.params;
        let sq = squeeze(series, &p.squeeze)?;
        let squeeze_type = IndicatorType::Squeeze {
            bb_length: p.squeeze.bb_length,
            kc_length: p.squeeze.kc_length,
            momentum_periods: p.squeeze.momentum_periods,
            momentum_length: p.squeeze.momentum_length,
        };

        let momentum = Operand::Series(&sq.momentum);
        let zero = Operand::Constant(0.0);

        let dmi_out = if p.use_dmi {
            Some(dmi(series, &p.dmi)?)
        } else {
            None
        };

        let positions = match &dmi_out {
            Some(d) => {
                let plus = Operand::Series(&d.plus_di);
                let minus = Operand::Series(&d.minus_di);
                let rules = SignalRules {
                    long: Rule::And(vec![
                        Rule::Above {
                            left: plus,
                            right: minus,
                        },
                        Rule::Above {
                            left: momentum,
                            right: zero,
                        },
                    ]),
                    short: Rule::And(vec![
                        Rule::Below {
                            left: plus,
                            right: minus,
                        },
                        Rule::Below {
                            left: momentum,
                            right: zero,
                        },
                    ]),
                };
                translate(&rules, series.len())
            }
            None => {
                let rules = SignalRules {
                    long: Rule::Above {
                        left: momentum,
                        right: zero,
                    },
                    short: Rule::Below {
                        left: momentum,
                        right: zero,
                    },
                };
                translate(&rules, series.len())
            }
        };

        let signal = if p.use_dmi {
            latest_trend(&positions)
        } else {
            sq.momentum.last().copied().flatten().map(|m| {
                if m >= 0.0 {
                    Trend::Bullish
                } else {
                    Trend::Bearish
                }
            })
        };

        let state_codes = sq.state_codes();
        let mut indicators = vec![
            IndicatorSeries::new(squeeze_type.clone(), "momentum", sq.momentum),
            IndicatorSeries::new(squeeze_type, "state", state_codes),
        ];
        if let Some(d) = dmi_out {
            let dmi_type = IndicatorType::Dmi {
                di_smoothing: p.dmi.di_smoothing,
                adx_length: p.dmi.adx_length,
            };
            indicators.push(IndicatorSeries::new(dmi_type.clone(), "plus_di", d.plus_di));
            indicators.push(IndicatorSeries::new(dmi_type.clone(), "minus_di", d.minus_di));
            indicators.push(IndicatorSeries::new(dmi_type, "adx", d.adx));
        }

        Ok(Evaluation {
            indicators,
            positions,
            signal,
            returns_field: PriceField::Close,
        })
    }
}

/// Search space over the band lengths and, optionally, the DMI lengths.
///
/// When both DMI axes are empty the DMI parameters of the base record are
/// kept and only the two band axes are swept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqueezeDmiGrid {
    pub bb_length: Vec<usize>,
    pub kc_length: Vec<usize>,
    pub di_smoothing: Vec<usize>,
    pub adx_length: Vec<usize>,
}

impl SqueezeDmiGrid {
    fn sweeps_dmi(&self) -> bool {
        !self.di_smoothing.is_empty() || !self.adx_length.is_empty()
    }
}

impl SearchSpace for SqueezeDmiGrid {
    type Params = SqueezeDmiParams;

    fn axis_names(&self) -> Vec<&'static str> {
        if self.sweeps_dmi() {
            vec!["bb_length", "kc_length", "di_smoothing", "adx_length"]
        } else {
            vec!["bb_length", "kc_length"]
        }
    }

    fn axes(&self) -> Vec<&[usize]> {
        let mut axes = vec![self.bb_length.as_slice(), self.kc_length.as_slice()];
        if self.sweeps_dmi() {
            axes.push(self.di_smoothing.as_slice());
            axes.push(self.adx_length.as_slice());
        }
        axes
    }

    fn params_at(&self, base: &SqueezeDmiParams, digits: &[usize]) -> SqueezeDmiParams {
        let mut params = base.clone();
        params.squeeze.bb_length = self.bb_length[digits[0]];
        params.squeeze.kc_length = self.kc_length[digits[1]];
        if self.sweeps_dmi() {
            params.dmi.di_smoothing = self.di_smoothing[digits[2]];
            params.dmi.adx_length = self.adx_length[digits[3]];
        }
        params
    }
}
