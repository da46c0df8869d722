//! Rolling-window statistics.
//!
//! A window value is defined only once the full window is available and
//! every value inside it is defined (minimum periods = window). The first
//! `window - 1` outputs are therefore always undefined.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, check_window, checked_div, defined};

fn rolling<F>(values: &[Option<f64>], window: usize, name: &str, f: F) -> Result<Series, StratlabError>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    check_window(name, window, values.len())?;

    let mut out = Vec::with_capacity(values.len());
    let mut buf = Vec::with_capacity(window);
    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        buf.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));
        out.push(if buf.len() == window { f(&buf) } else { None });
    }
    Ok(out)
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Series, StratlabError> {
    rolling(values, window, "rolling mean", |w| {
        Some(w.iter().sum::<f64>() / w.len() as f64)
    })
}

/// Rolling standard deviation with `ddof` delta degrees of freedom
/// (0 = population, 1 = sample).
pub fn rolling_std(
    values: &[Option<f64>],
    window: usize,
    ddof: usize,
) -> Result<Series, StratlabError> {
    if ddof > 1 {
        return Err(StratlabError::invalid_parameter("ddof", "must be 0 or 1"));
    }
    rolling(values, window, "rolling std", |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let ss: f64 = w.iter().map(|x| (x - mean) * (x - mean)).sum();
        checked_div(ss, n - ddof as f64).map(f64::sqrt)
    })
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Result<Series, StratlabError> {
    rolling(values, window, "rolling max", |w| {
        w.iter().copied().reduce(f64::max)
    })
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Result<Series, StratlabError> {
    rolling(values, window, "rolling min", |w| {
        w.iter().copied().reduce(f64::min)
    })
}

/// Simple moving average of plain prices.
pub fn sma(values: &[f64], period: usize) -> Result<Series, StratlabError> {
    check_window("SMA", period, values.len())?;
    rolling_mean(&defined(values), period)
}
