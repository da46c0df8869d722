//! Result output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratlabError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::{Evaluation, StrategyKind};
use std::path::Path;

/// One line of an optimizer ranking, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub rank: usize,
    pub values: Vec<usize>,
    pub terminal: f64,
}

pub trait ReportPort {
    fn write_ranking(
        &self,
        strategy: StrategyKind,
        axis_names: &[&str],
        rows: &[RankingRow],
        output: &Path,
    ) -> Result<(), StratlabError>;

    /// Per-bar dump of indicators, positions and the cumulative return.
    fn write_evaluation(
        &self,
        series: &PriceSeries,
        evaluation: &Evaluation,
        result: &BacktestResult,
        output: &Path,
    ) -> Result<(), StratlabError>;
}
