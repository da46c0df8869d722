//! Weighted Moving Average.
//!
//! O(n) sliding window: adding a bar raises every existing weight by one,
//! so the weighted sum grows by `n * P[i] - window_sum`.
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! Warmup: first (n-1) bars are undefined.

use crate::domain::error::StratlabError;
use crate::domain::indicator_helpers::{Series, check_window};

pub fn wma(values: &[f64], period: usize) -> Result<Series, StratlabError> {
    check_window("WMA", period, values.len())?;

    let mut out = Vec::with_capacity(values.len());
    let divisor = (period * (period + 1)) as f64 / 2.0;
    let mut weighted_sum = 0.0;
    let mut window_sum = 0.0;

    for (i, &price) in values.iter().enumerate() {
        if i < period {
            weighted_sum += (i + 1) as f64 * price;
            window_sum += price;
        } else {
            weighted_sum += period as f64 * price - window_sum;
            window_sum += price - values[i - period];
        }
        out.push((i + 1 >= period).then(|| weighted_sum / divisor));
    }
    Ok(out)
}
