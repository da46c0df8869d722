//! RSI (Relative Strength Index).
//!
//! Gains and losses are the positive and negative parts of the one-bar price
//! change, with the missing change at bar 0 counted as zero. Both are
//! smoothed with a recursive span-`n` EMA gated on `n` observations.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! avg_loss == 0 and avg_gain > 0: RSI = 100
//! avg_loss == 0 and avg_gain == 0: undefined (flat prices)
//!
//! Warmup: first (n-1) bars are undefined.

use crate::domain::error::StratlabError;
use crate::domain::indicator::ema::{EwmOptions, ewm};
use crate::domain::indicator_helpers::{Series, check_window, zip_with};

pub const DEFAULT_PERIOD: usize = 14;

pub fn rsi(values: &[f64], period: usize) -> Result<Series, StratlabError> {
    check_window("RSI", period, values.len())?;

    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());
    gains.push(Some(0.0));
    losses.push(Some(0.0));
    for w in values.windows(2) {
        let change = w[1] - w[0];
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let options = EwmOptions::recursive_span(period);
    let avg_gain = ewm(&gains, &options)?;
    let avg_loss = ewm(&losses, &options)?;

    Ok(zip_with(&avg_gain, &avg_loss, |g, l| {
        if l == 0.0 {
            (g > 0.0).then_some(100.0)
        } else {
            Some(100.0 - 100.0 / (1.0 + g / l))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_warmup() {
        let s = rsi(&[1.0, 2.0, 3.0, 2.0, 1.0], 3).unwrap();
        assert_eq!(s[0], None);
        assert_eq!(s[1], None);
        assert!(s[2].is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let s = rsi(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_relative_eq!(s[4].unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let s = rsi(&[5.0, 4.0, 3.0, 2.0, 1.0], 3).unwrap();
        assert_relative_eq!(s[4].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_flat_prices_undefined() {
        let s = rsi(&[3.0; 6], 3).unwrap();
        assert!(s.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_known_value() {
        // span 3 => a = 0.5
        // gains:  0, 1, 0, 2     -> ewm: 0, 0.5, 0.25, 1.125
        // losses: 0, 0, 1, 0     -> ewm: 0, 0, 0.5, 0.25
        let s = rsi(&[10.0, 11.0, 10.0, 12.0], 3).unwrap();
        let rs2: f64 = 0.25 / 0.5;
        assert_relative_eq!(s[2].unwrap(), 100.0 - 100.0 / (1.0 + rs2), epsilon = 1e-9);
        let rs3: f64 = 1.125 / 0.25;
        assert_relative_eq!(s[3].unwrap(), 100.0 - 100.0 / (1.0 + rs3), epsilon = 1e-9);
    }

    #[test]
    fn rsi_bounded() {
        let prices = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1];
        let s = rsi(&prices, 5).unwrap();
        for v in s.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}
