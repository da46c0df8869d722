//! Stateful wrapper with the calculate → backtest → optimize call order.
//!
//! `backtest` and `optimize` require a prior `calculate`. After `optimize`
//! the session is recomputed with its original parameters, so its
//! configuration and last evaluation match what they were before the sweep.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratlabError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::optimizer::{self, OptimizationReport, OptimizeOptions};
use crate::domain::strategy::{Evaluation, Strategy};

pub struct StrategySession<'a, S: Strategy> {
    strategy: S,
    series: &'a PriceSeries,
    evaluation: Option<Evaluation>,
    result: Option<BacktestResult>,
}

impl<'a, S: Strategy> StrategySession<'a, S> {
    pub fn new(strategy: S, series: &'a PriceSeries) -> Self {
        Self {
            strategy,
            series,
            evaluation: None,
            result: None,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn result(&self) -> Option<&BacktestResult> {
        self.result.as_ref()
    }

    /// Compute indicators and positions, replacing any previous evaluation.
    pub fn calculate(&mut self) -> Result<&Evaluation, StratlabError> {
        let evaluation = self.strategy.calculate(self.series)?;
        self.result = None;
        Ok(self.evaluation.insert(evaluation))
    }

    pub fn backtest(&mut self) -> Result<&BacktestResult, StratlabError> {
        let evaluation = self.evaluation.as_ref().ok_or(StratlabError::Precondition {
            operation: "backtest",
            reason: "no evaluation available".into(),
        })?;
        let result = evaluation.backtest(self.series)?;
        Ok(self.result.insert(result))
    }

    pub fn optimize(
        &mut self,
        grid: &S::Grid,
        options: &OptimizeOptions,
    ) -> Result<OptimizationReport<S::Params>, StratlabError> {
        if self.evaluation.is_none() {
            return Err(StratlabError::Precondition {
                operation: "optimize",
                reason: "no evaluation available".into(),
            });
        }
        let had_result = self.result.is_some();
        let report = optimizer::optimize(&self.strategy, grid, self.series, options)?;

        // Restore the canonical state for the original parameters.
        self.calculate()?;
        if had_result {
            self.backtest()?;
        }
        Ok(report)
    }
}
