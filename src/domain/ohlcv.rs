//! OHLCV bar representation and the validated price series.

use crate::domain::error::StratlabError;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }
}

/// Price column an indicator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
        };
        f.write_str(name)
    }
}

impl FromStr for PriceField {
    type Err = StratlabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            other => Err(StratlabError::invalid_parameter(
                "source",
                format!("unknown price field '{other}'"),
            )),
        }
    }
}

/// Non-empty bars with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, StratlabError> {
        if bars.is_empty() {
            return Err(StratlabError::EmptySeries);
        }
        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(StratlabError::UnorderedSeries { index: i + 1 });
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> &OhlcvBar {
        // non-empty by construction
        &self.bars[self.bars.len() - 1]
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn field(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.field(field)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.field(PriceField::Close)
    }

    pub fn highs(&self) -> Vec<f64> {
        self.field(PriceField::High)
    }

    pub fn lows(&self) -> Vec<f64> {
        self.field(PriceField::Low)
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        self.bars.iter().map(OhlcvBar::typical_price).collect()
    }

    /// True range per bar; undefined at bar 0 where there is no previous close.
    pub fn true_ranges(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.bars.len());
        out.push(None);
        for w in self.bars.windows(2) {
            out.push(Some(w[1].true_range(w[0].close)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            timestamp: ts(15),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        // (110 + 90 + 105) / 3 = 101.666...
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_field_parse() {
        assert_eq!("close".parse::<PriceField>().unwrap(), PriceField::Close);
        assert_eq!(" High ".parse::<PriceField>().unwrap(), PriceField::High);
        assert!("adj close".parse::<PriceField>().is_err());
    }

    #[test]
    fn series_rejects_empty() {
        assert!(matches!(
            PriceSeries::new(vec![]),
            Err(StratlabError::EmptySeries)
        ));
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let a = sample_bar();
        let b = sample_bar();
        assert!(matches!(
            PriceSeries::new(vec![a, b]),
            Err(StratlabError::UnorderedSeries { index: 1 })
        ));
    }

    #[test]
    fn series_true_ranges_undefined_at_start() {
        let mut second = sample_bar();
        second.timestamp = ts(16);
        let series = PriceSeries::new(vec![sample_bar(), second]).unwrap();
        let tr = series.true_ranges();
        assert_eq!(tr[0], None);
        assert_eq!(tr[1], Some(20.0));
    }
}
