//! Chop Zone.
//!
//! Measures the slope of an EMA relative to the recent price range and
//! buckets it into nine zones.
//!
//! TP    = (H + L + C) / 3
//! range = 25 / (max - min) * min      (rolling max/min of the source over `length`)
//! y     = (EMA[t-1] - EMA[t]) / TP[t] * range
//! angle = round(deg(atan(|y|))), negated when y > 0 (falling EMA)
//!
//! The angle is rounded half to even. Undefined before bar
//! `max(length, ema_length)`, and wherever the price range or TP is zero.

use crate::domain::error::StratlabError;
use crate::domain::indicator::ema::ema;
use crate::domain::indicator::rolling::{rolling_max, rolling_min};
use crate::domain::indicator_helpers::{Series, check_window, checked_div, defined};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::Trend;

pub const DEFAULT_LENGTH: usize = 30;
pub const DEFAULT_EMA_LENGTH: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChopZone {
    StrongBullish,
    ModerateBullish,
    MildBullish,
    WeakBullish,
    StrongBearish,
    ModerateBearish,
    MildBearish,
    WeakBearish,
    Neutral,
}

impl ChopZone {
    pub const ALL: [ChopZone; 9] = [
        ChopZone::StrongBullish,
        ChopZone::ModerateBullish,
        ChopZone::MildBullish,
        ChopZone::WeakBullish,
        ChopZone::StrongBearish,
        ChopZone::ModerateBearish,
        ChopZone::MildBearish,
        ChopZone::WeakBearish,
        ChopZone::Neutral,
    ];

    pub fn from_angle(angle: f64) -> Self {
        if angle >= 5.0 {
            ChopZone::StrongBullish
        } else if angle >= 3.57 {
            ChopZone::ModerateBullish
        } else if angle >= 2.14 {
            ChopZone::MildBullish
        } else if angle >= 0.71 {
            ChopZone::WeakBullish
        } else if angle <= -5.0 {
            ChopZone::StrongBearish
        } else if angle <= -3.57 {
            ChopZone::ModerateBearish
        } else if angle <= -2.14 {
            ChopZone::MildBearish
        } else if angle <= -0.71 {
            ChopZone::WeakBearish
        } else {
            ChopZone::Neutral
        }
    }

    /// Zone code 0..=8.
    pub fn code(self) -> u8 {
        match self {
            ChopZone::StrongBullish => 0,
            ChopZone::ModerateBullish => 1,
            ChopZone::MildBullish => 2,
            ChopZone::WeakBullish => 3,
            ChopZone::StrongBearish => 4,
            ChopZone::ModerateBearish => 5,
            ChopZone::MildBearish => 6,
            ChopZone::WeakBearish => 7,
            ChopZone::Neutral => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Zones 0-3 are bullish, 4-7 bearish, 8 has no direction.
    pub fn trend(self) -> Option<Trend> {
        match self.code() {
            0..=3 => Some(Trend::Bullish),
            4..=7 => Some(Trend::Bearish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChopZoneOutput {
    pub angle: Series,
    pub zone: Vec<Option<ChopZone>>,
}

impl ChopZoneOutput {
    pub fn zone_codes(&self) -> Series {
        self.zone
            .iter()
            .map(|z| z.map(|z| f64::from(z.code())))
            .collect()
    }
}

pub fn chop_zone(
    series: &PriceSeries,
    source: PriceField,
    length: usize,
    ema_length: usize,
) -> Result<ChopZoneOutput, StratlabError> {
    check_window("Chop Zone length", length, series.len())?;
    check_window("Chop Zone EMA", ema_length, series.len())?;
    let start = length.max(ema_length);
    check_window("Chop Zone", start + 1, series.len())?;

    let prices = series.field(source);
    let tp = series.typical_prices();
    let hi = rolling_max(&defined(&prices), length)?;
    let lo = rolling_min(&defined(&prices), length)?;
    let ema = ema(&prices, ema_length)?;

    let angle: Series = (0..series.len())
        .map(|i| {
            if i < start {
                return None;
            }
            let (hi, lo) = (hi[i]?, lo[i]?);
            let range = checked_div(25.0, hi - lo)? * lo;
            let slope = checked_div(ema[i - 1]? - ema[i]?, tp[i])? * range;
            let degrees = slope.abs().atan().to_degrees().round_ties_even();
            Some(if slope > 0.0 { -degrees } else { degrees })
        })
        .collect();
    let zone = angle.iter().map(|a| a.map(ChopZone::from_angle)).collect();

    Ok(ChopZoneOutput { angle, zone })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn make_series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn zone_thresholds() {
        assert_eq!(ChopZone::from_angle(5.0), ChopZone::StrongBullish);
        assert_eq!(ChopZone::from_angle(4.0), ChopZone::ModerateBullish);
        assert_eq!(ChopZone::from_angle(3.0), ChopZone::MildBullish);
        assert_eq!(ChopZone::from_angle(1.0), ChopZone::WeakBullish);
        assert_eq!(ChopZone::from_angle(0.0), ChopZone::Neutral);
        assert_eq!(ChopZone::from_angle(-1.0), ChopZone::WeakBearish);
        assert_eq!(ChopZone::from_angle(-3.0), ChopZone::MildBearish);
        assert_eq!(ChopZone::from_angle(-4.0), ChopZone::ModerateBearish);
        assert_eq!(ChopZone::from_angle(-45.0), ChopZone::StrongBearish);
    }

    #[test]
    fn zone_codes_round_trip() {
        for zone in ChopZone::ALL {
            assert_eq!(ChopZone::from_code(zone.code()), Some(zone));
        }
        assert_eq!(ChopZone::from_code(9), None);
    }

    #[test]
    fn zone_trends() {
        assert_eq!(ChopZone::StrongBullish.trend(), Some(Trend::Bullish));
        assert_eq!(ChopZone::WeakBullish.trend(), Some(Trend::Bullish));
        assert_eq!(ChopZone::StrongBearish.trend(), Some(Trend::Bearish));
        assert_eq!(ChopZone::WeakBearish.trend(), Some(Trend::Bearish));
        assert_eq!(ChopZone::Neutral.trend(), None);
    }

    #[test]
    fn undefined_before_start() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = chop_zone(&make_series(&closes), PriceField::Close, 5, 7).unwrap();
        assert!(out.zone[..7].iter().all(Option::is_none));
        assert!(out.zone[7].is_some());
    }

    #[test]
    fn rising_prices_are_bullish() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 * 1.02_f64.powi(i)).collect();
        let out = chop_zone(&make_series(&closes), PriceField::Close, 5, 5).unwrap();
        let last = out.zone[39].unwrap();
        assert_eq!(last.trend(), Some(Trend::Bullish));
        assert!(out.angle[39].unwrap() > 0.0);
    }

    #[test]
    fn falling_prices_are_bearish() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 * 0.98_f64.powi(i)).collect();
        let out = chop_zone(&make_series(&closes), PriceField::Close, 5, 5).unwrap();
        assert_eq!(out.zone[39].unwrap().trend(), Some(Trend::Bearish));
        assert!(out.angle[39].unwrap() < 0.0);
    }

    #[test]
    fn flat_prices_have_zero_range() {
        let out = chop_zone(&make_series(&[50.0; 12]), PriceField::Close, 3, 3).unwrap();
        assert!(out.zone.iter().all(Option::is_none));
    }

    #[test]
    fn angle_is_whole_degrees() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let out = chop_zone(&make_series(&closes), PriceField::Close, 6, 8).unwrap();
        for a in out.angle.into_iter().flatten() {
            assert_eq!(a, a.round());
        }
    }

    #[test]
    fn needs_more_bars_than_longest_window() {
        let closes: Vec<f64> = (0..7).map(|i| 100.0 + i as f64).collect();
        assert!(matches!(
            chop_zone(&make_series(&closes), PriceField::Close, 5, 7),
            Err(StratlabError::WindowTooLong { .. })
        ));
    }
}
