//! Bollinger Bands.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev takes an explicit `ddof`: 0 for the population deviation,
//! 1 for the sample deviation.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::error::StratlabError;
use crate::domain::indicator::rolling::{rolling_std, sma};
use crate::domain::indicator_helpers::{Series, defined, zip_with};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn bollinger(
    values: &[f64],
    period: usize,
    mult: f64,
    ddof: usize,
) -> Result<BollingerOutput, StratlabError> {
    if !mult.is_finite() || mult < 0.0 {
        return Err(StratlabError::invalid_parameter(
            "bollinger multiplier",
            format!("{mult} must be a non-negative number"),
        ));
    }
    let middle = sma(values, period)?;
    let std = rolling_std(&defined(values), period, ddof)?;
    let upper = zip_with(&middle, &std, |m, s| Some(m + mult * s));
    let lower = zip_with(&middle, &std, |m, s| Some(m - mult * s));

    Ok(BollingerOutput {
        upper,
        middle,
        lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup() {
        let out = bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0, 0).unwrap();
        assert_eq!(out.middle[1], None);
        assert_eq!(out.upper[1], None);
        assert_eq!(out.lower[1], None);
        assert!(out.upper[2].is_some());
    }

    #[test]
    fn bollinger_population_bands() {
        // window [2, 4, 6]: mean 4, population std sqrt(8/3)
        let out = bollinger(&[2.0, 4.0, 6.0], 3, 2.0, 0).unwrap();
        let sd = (8.0_f64 / 3.0).sqrt();
        assert_relative_eq!(out.middle[2].unwrap(), 4.0);
        assert_relative_eq!(out.upper[2].unwrap(), 4.0 + 2.0 * sd, epsilon = 1e-12);
        assert_relative_eq!(out.lower[2].unwrap(), 4.0 - 2.0 * sd, epsilon = 1e-12);
    }

    #[test]
    fn bollinger_sample_bands_are_wider() {
        let prices = [2.0, 4.0, 6.0];
        let pop = bollinger(&prices, 3, 2.0, 0).unwrap();
        let sample = bollinger(&prices, 3, 2.0, 1).unwrap();
        assert!(sample.upper[2].unwrap() > pop.upper[2].unwrap());
        // sample std of [2, 4, 6] is exactly 2
        assert_relative_eq!(sample.upper[2].unwrap(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn bollinger_constant_prices_collapse() {
        let out = bollinger(&[5.0; 4], 3, 2.0, 0).unwrap();
        assert_relative_eq!(out.upper[3].unwrap(), 5.0);
        assert_relative_eq!(out.lower[3].unwrap(), 5.0);
    }

    #[test]
    fn bollinger_rejects_negative_mult() {
        assert!(bollinger(&[1.0, 2.0], 2, -1.0, 0).is_err());
    }
}
