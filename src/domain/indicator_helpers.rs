//! Shared helper functions for indicator calculations.
//!
//! Every derived series is a `Series` (`Vec<Option<f64>>`) aligned with the
//! price bars. `None` marks an undefined value, either warm-up or a
//! division by zero; it is never coerced to zero.

use crate::domain::error::StratlabError;

pub type Series = Vec<Option<f64>>;

/// Reject zero windows, empty inputs and windows longer than the input.
pub fn check_window(name: &str, window: usize, len: usize) -> Result<(), StratlabError> {
    if window == 0 {
        return Err(StratlabError::invalid_parameter(
            name,
            "window must be at least 1",
        ));
    }
    if len == 0 {
        return Err(StratlabError::EmptySeries);
    }
    if window > len {
        return Err(StratlabError::WindowTooLong {
            name: name.to_string(),
            window,
            bars: len,
        });
    }
    Ok(())
}

/// Lift plain values into a fully defined series.
pub fn defined(values: &[f64]) -> Series {
    values.iter().map(|&v| Some(v)).collect()
}

/// `numerator / denominator`, undefined on a zero denominator or a non-finite result.
pub fn checked_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let q = numerator / denominator;
    q.is_finite().then_some(q)
}

/// Lag a series by `periods` bars, filling the head with `None`.
pub fn shift(series: &[Option<f64>], periods: usize) -> Series {
    (0..series.len())
        .map(|i| if i < periods { None } else { series[i - periods] })
        .collect()
}

/// `x[t] - x[t - periods]`.
pub fn diff(values: &[f64], periods: usize) -> Series {
    (0..values.len())
        .map(|i| (i >= periods).then(|| values[i] - values[i - periods]))
        .collect()
}

/// Simple period return `x[t] / x[t-1] - 1`; undefined at bar 0 and after a zero price.
pub fn pct_change(values: &[f64]) -> Series {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for w in values.windows(2) {
        out.push(checked_div(w[1], w[0]).map(|r| r - 1.0));
    }
    out
}

/// Combine two aligned series index-wise; undefined wherever either input is.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> Option<f64>,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

/// Index of the first defined value.
pub fn first_defined(series: &[Option<f64>]) -> Option<usize> {
    series.iter().position(Option::is_some)
}
