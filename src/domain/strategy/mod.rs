//! Strategies: indicator combinations that yield position states.
//!
//! Each strategy owns a typed parameter record and turns a price series
//! into an immutable [`Evaluation`]. The backtest and the optimizer both
//! consume evaluations; nothing is cached on the strategy itself.

pub mod chop_zone;
pub mod macd_rsi_bollinger;
pub mod squeeze_dmi;

use crate::domain::backtest::{BacktestResult, compound};
use crate::domain::error::StratlabError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::{Position, Trend};
use std::fmt;
use std::str::FromStr;

pub use chop_zone::{ChopZoneGrid, ChopZoneParams, ChopZoneStrategy};
pub use macd_rsi_bollinger::{
    MacdRsiBollingerGrid, MacdRsiBollingerParams, MacdRsiBollingerStrategy,
};
pub use squeeze_dmi::{SqueezeDmiGrid, SqueezeDmiParams, SqueezeDmiStrategy};

/// Output of one `calculate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub indicators: Vec<IndicatorSeries>,
    pub positions: Vec<Option<Position>>,
    /// Direction at the latest bar, if any.
    pub signal: Option<Trend>,
    /// Price column the positions are compounded over.
    pub returns_field: PriceField,
}

impl Evaluation {
    /// Compound the positions over the `returns_field` prices of `series`.
    pub fn backtest(&self, series: &PriceSeries) -> Result<BacktestResult, StratlabError> {
        compound(&self.positions, &series.field(self.returns_field))
    }

    pub fn indicator(&self, label: &str) -> Option<&IndicatorSeries> {
        self.indicators.iter().find(|s| s.label() == label)
    }
}

pub trait Strategy: Clone + Send + Sync {
    type Params: Clone + fmt::Debug + Send + Sync;
    type Grid: SearchSpace<Params = Self::Params> + Sync;

    fn name(&self) -> &'static str;

    fn params(&self) -> &Self::Params;

    /// A copy of this strategy bound to other parameters.
    fn with_params(&self, params: Self::Params) -> Self;

    fn calculate(&self, series: &PriceSeries) -> Result<Evaluation, StratlabError>;
}

/// Candidate values per optimisable parameter of one strategy.
///
/// Axes are ordered; combinations enumerate with the last axis varying
/// fastest.
pub trait SearchSpace {
    type Params;

    fn axis_names(&self) -> Vec<&'static str>;

    fn axes(&self) -> Vec<&[usize]>;

    /// `base` with every axis set to the candidate picked by `digits`.
    fn params_at(&self, base: &Self::Params, digits: &[usize]) -> Self::Params;

    /// Candidate values picked by `digits`, aligned with `axis_names`.
    fn values_at(&self, digits: &[usize]) -> Vec<usize> {
        self.axes()
            .iter()
            .zip(digits)
            .map(|(axis, &d)| axis[d])
            .collect()
    }
}

/// The closed set of available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    ChopZone,
    SqueezeDmi,
    MacdRsiBollinger,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::ChopZone,
        StrategyKind::SqueezeDmi,
        StrategyKind::MacdRsiBollinger,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::ChopZone => "chop-zone",
            StrategyKind::SqueezeDmi => "squeeze-dmi",
            StrategyKind::MacdRsiBollinger => "macd-rsi-bollinger",
        }
    }

    /// Config section holding this strategy's parameters.
    pub fn section(self) -> &'static str {
        match self {
            StrategyKind::ChopZone => "chop_zone",
            StrategyKind::SqueezeDmi => "squeeze_dmi",
            StrategyKind::MacdRsiBollinger => "macd_rsi_bollinger",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StratlabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| {
                StratlabError::invalid_parameter("strategy", format!("unknown strategy '{s}'"))
            })
    }
}

/// A configured strategy of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    ChopZone(ChopZoneParams),
    SqueezeDmi(SqueezeDmiParams),
    MacdRsiBollinger(MacdRsiBollingerParams),
}

impl StrategyConfig {
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::ChopZone => StrategyConfig::ChopZone(ChopZoneParams::default()),
            StrategyKind::SqueezeDmi => StrategyConfig::SqueezeDmi(SqueezeDmiParams::default()),
            StrategyKind::MacdRsiBollinger => {
                StrategyConfig::MacdRsiBollinger(MacdRsiBollingerParams::default())
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::ChopZone(_) => StrategyKind::ChopZone,
            StrategyConfig::SqueezeDmi(_) => StrategyKind::SqueezeDmi,
            StrategyConfig::MacdRsiBollinger(_) => StrategyKind::MacdRsiBollinger,
        }
    }

    pub fn calculate(&self, series: &PriceSeries) -> Result<Evaluation, StratlabError> {
        match self {
            StrategyConfig::ChopZone(p) => ChopZoneStrategy::new(p.clone()).calculate(series),
            StrategyConfig::SqueezeDmi(p) => SqueezeDmiStrategy::new(p.clone()).calculate(series),
            StrategyConfig::MacdRsiBollinger(p) => {
                MacdRsiBollingerStrategy::new(p.clone()).calculate(series)
            }
        }
    }
}

/// Evaluate every strategy over one series. A failing strategy is logged
/// and reported in place; the others still run.
pub fn evaluate_all(
    configs: &[StrategyConfig],
    series: &PriceSeries,
) -> Vec<(StrategyKind, Result<Evaluation, StratlabError>)> {
    configs
        .iter()
        .map(|config| {
            let kind = config.kind();
            let result = config.calculate(series);
            if let Err(e) = &result {
                tracing::warn!(strategy = %kind, error = %e, "strategy evaluation failed");
            }
            (kind, result)
        })
        .collect()
}
