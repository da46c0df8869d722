//! Exponentially weighted moving averages.
//!
//! Two conventions are supported and every caller picks one explicitly:
//!
//! - recursive (`adjust = false`): seed with the first defined input, then
//!   `y[t] = (1 - a) * y[t-1] + a * x[t]`
//! - adjusted (`adjust = true`): weighted mean of all defined inputs so far
//!   with weights `(1 - a)^i`, newest first
//!
//! Leading undefined inputs are skipped and `min_periods` counts defined
//! observations. An undefined input after the seed yields an undefined
//! output and leaves the running state untouched.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, check_window, defined};

/// Decay parameter for `ewm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decay {
    /// `alpha = 2 / (span + 1)`
    Span(usize),
    Alpha(f64),
}

impl Decay {
    pub fn alpha(&self) -> Result<f64, StratlabError> {
        match *self {
            Decay::Span(0) => Err(StratlabError::invalid_parameter(
                "span",
                "must be at least 1",
            )),
            Decay::Span(span) => Ok(2.0 / (span as f64 + 1.0)),
            Decay::Alpha(a) if a > 0.0 && a <= 1.0 => Ok(a),
            Decay::Alpha(a) => Err(StratlabError::invalid_parameter(
                "alpha",
                format!("{a} is outside (0, 1]"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EwmOptions {
    pub decay: Decay,
    pub min_periods: usize,
    pub adjust: bool,
}

impl EwmOptions {
    /// Recursive span EMA gated on `span` observations.
    pub fn recursive_span(span: usize) -> Self {
        Self {
            decay: Decay::Span(span),
            min_periods: span,
            adjust: false,
        }
    }
}

pub fn ewm(values: &[Option<f64>], options: &EwmOptions) -> Result<Series, StratlabError> {
    if values.is_empty() {
        return Err(StratlabError::EmptySeries);
    }
    let alpha = options.decay.alpha()?;
    let keep = 1.0 - alpha;
    let min_periods = options.min_periods.max(1);

    let mut out = Vec::with_capacity(values.len());
    let mut observed = 0usize;
    // recursive: `num` holds y; adjusted: num / den is the weighted mean
    let mut num = 0.0;
    let mut den = 0.0;

    for v in values {
        let Some(x) = *v else {
            out.push(None);
            continue;
        };
        observed += 1;
        if options.adjust {
            num = num * keep + x;
            den = den * keep + 1.0;
        } else if observed == 1 {
            num = x;
        } else {
            num = keep * num + alpha * x;
        }
        let y = if options.adjust { num / den } else { num };
        out.push((observed >= min_periods).then_some(y));
    }
    Ok(out)
}

/// Recursive EMA with span `period`, undefined for the first `period - 1` bars.
pub fn ema(values: &[f64], period: usize) -> Result<Series, StratlabError> {
    check_window("EMA", period, values.len())?;
    ewm(&defined(values), &EwmOptions::recursive_span(period))
}
