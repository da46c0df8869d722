//! Grid / sampled parameter search.
//!
//! Combinations are addressed by a mixed-radix index over the candidate
//! axes, last axis fastest. When the product exceeds `max_trials` a uniform
//! sample without replacement is drawn and evaluated in product order.
//! Every trial runs on its own strategy copy; the sweep is spread over a
//! rayon pool and merged before ranking.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::{SearchSpace, Strategy};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;

pub const DEFAULT_MAX_TRIALS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeOptions {
    pub max_trials: usize,
    /// Sampling seed; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_trials: DEFAULT_MAX_TRIALS,
            seed: None,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trial<P> {
    pub params: P,
    /// Candidate value per axis, aligned with the report's `axis_names`.
    pub values: Vec<usize>,
    pub terminal: f64,
}

#[derive(Debug)]
pub struct FailedTrial {
    pub values: Vec<usize>,
    pub error: StratlabError,
}

#[derive(Debug)]
pub struct OptimizationReport<P> {
    pub axis_names: Vec<&'static str>,
    /// Successful trials, best terminal return first.
    pub ranked: Vec<Trial<P>>,
    pub failures: Vec<FailedTrial>,
    /// Size of the full Cartesian product.
    pub combinations: usize,
    /// True when fewer than `combinations` trials were run.
    pub sampled: bool,
}

impl<P> OptimizationReport<P> {
    pub fn best(&self) -> Option<&Trial<P>> {
        self.ranked.first()
    }

    pub fn evaluated(&self) -> usize {
        self.ranked.len() + self.failures.len()
    }
}

/// Sort by descending terminal return. Stable: ties keep their order.
pub fn rank<P>(trials: &mut [Trial<P>]) {
    trials.sort_by(|a, b| b.terminal.total_cmp(&a.terminal));
}

fn combination_count(axes: &[&[usize]], names: &[&'static str]) -> Result<usize, StratlabError> {
    if axes.is_empty() {
        return Err(StratlabError::invalid_parameter(
            "grid",
            "no parameter axes to search",
        ));
    }
    axes.iter().zip(names).try_fold(1usize, |acc, (axis, name)| {
        if axis.is_empty() {
            return Err(StratlabError::invalid_parameter(
                name,
                "candidate list is empty",
            ));
        }
        acc.checked_mul(axis.len())
            .ok_or_else(|| StratlabError::invalid_parameter("grid", "too many combinations"))
    })
}

/// Mixed-radix digits of `index`, last axis varying fastest.
fn decode(mut index: usize, radices: &[usize]) -> Vec<usize> {
    let mut digits = vec![0; radices.len()];
    for (slot, &radix) in digits.iter_mut().zip(radices).rev() {
        *slot = index % radix;
        index /= radix;
    }
    digits
}

fn select_indices(total: usize, options: &OptimizeOptions) -> Vec<usize> {
    if total <= options.max_trials {
        return (0..total).collect();
    }
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut picked = index::sample(&mut rng, total, options.max_trials).into_vec();
    picked.sort_unstable();
    picked
}

fn run_trial<S: Strategy>(
    strategy: &S,
    params: S::Params,
    series: &PriceSeries,
) -> Result<f64, StratlabError> {
    let candidate = strategy.with_params(params);
    let evaluation = candidate.calculate(series)?;
    Ok(evaluation.backtest(series)?.terminal)
}

/// Search `grid` around the parameters of `strategy` over `series`.
///
/// `strategy` itself is never modified. Failed combinations are collected
/// in the report and do not stop the sweep.
pub fn optimize<S: Strategy>(
    strategy: &S,
    grid: &S::Grid,
    series: &PriceSeries,
    options: &OptimizeOptions,
) -> Result<OptimizationReport<S::Params>, StratlabError> {
    if options.max_trials == 0 {
        return Err(StratlabError::invalid_parameter(
            "max_trials",
            "must be at least 1",
        ));
    }
    let axis_names = grid.axis_names();
    let axes = grid.axes();
    let combinations = combination_count(&axes, &axis_names)?;
    let radices: Vec<usize> = axes.iter().map(|a| a.len()).collect();

    let selected = select_indices(combinations, options);
    let sampled = selected.len() < combinations;
    tracing::info!(
        strategy = strategy.name(),
        combinations,
        trials = selected.len(),
        sampled,
        "starting parameter search"
    );

    let base = strategy.params();
    let sweep = || -> Vec<(Vec<usize>, S::Params, Result<f64, StratlabError>)> {
        selected
            .par_iter()
            .map(|&i| {
                let digits = decode(i, &radices);
                let params = grid.params_at(base, &digits);
                let outcome = run_trial(strategy, params.clone(), series);
                (grid.values_at(&digits), params, outcome)
            })
            .collect()
    };

    let outcomes = match options.threads {
        Some(0) => {
            return Err(StratlabError::invalid_parameter(
                "threads",
                "must be at least 1",
            ));
        }
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| StratlabError::invalid_parameter("threads", e.to_string()))?
            .install(sweep),
        None => sweep(),
    };

    let mut ranked = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (values, params, outcome) in outcomes {
        match outcome {
            Ok(terminal) => ranked.push(Trial {
                params,
                values,
                terminal,
            }),
            Err(error) => {
                tracing::warn!(?values, %error, "trial failed");
                failures.push(FailedTrial { values, error });
            }
        }
    }
    rank(&mut ranked);

    match ranked.first() {
        Some(best) => tracing::info!(
            best = best.terminal,
            failed = failures.len(),
            "parameter search finished"
        ),
        None => tracing::warn!(failed = failures.len(), "no combination succeeded"),
    }

    Ok(OptimizationReport {
        axis_names,
        ranked,
        failures,
        combinations,
        sampled,
    })
}
