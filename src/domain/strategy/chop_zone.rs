//! Chop Zone trend strategy.
//!
//! Long while the chop zone sits in an active bullish zone, short while it
//! sits in an active bearish zone, flat otherwise. Neutral is never traded.
//!
//! The latest signal ignores `active_zones`: only the two strong zones at
//! the final bar report a direction. Returns are compounded over `source`.

use crate::domain::error::StratlabError;
use crate::domain::indicator::chop_zone::{ChopZone, DEFAULT_EMA_LENGTH, DEFAULT_LENGTH, chop_zone};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::signal::{Position, Trend};
use crate::domain::strategy::{Evaluation, SearchSpace, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct ChopZoneParams {
    pub length: usize,
    pub ema_length: usize,
    pub source: PriceField,
    pub active_zones: Vec<ChopZone>,
}

impl Default for ChopZoneParams {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            ema_length: DEFAULT_EMA_LENGTH,
            source: PriceField::Close,
            active_zones: vec![ChopZone::StrongBullish, ChopZone::StrongBearish],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChopZoneStrategy {
    params: ChopZoneParams,
}

impl ChopZoneStrategy {
    pub fn new(params: ChopZoneParams) -> Self {
        Self { params }
    }

    fn position(&self, zone: ChopZone) -> Position {
        if !self.params.active_zones.contains(&zone) {
            return Position::Flat;
        }
        zone.trend().map(Position::from).unwrap_or(Position::Flat)
    }
}

fn strong_trend(zone: ChopZone) -> Option<Trend> {
    match zone {
        ChopZone::StrongBullish => Some(Trend::Bullish),
        ChopZone::StrongBearish => Some(Trend::Bearish),
        _ => None,
    }
}

impl Strategy for ChopZoneStrategy {
    type Params = ChopZoneParams;
    type Grid = ChopZoneGrid;

    fn name(&self) -> &'static str {
        "chop-zone"
    }

    fn params(&self) -> &ChopZoneParams {
        &self.params
    }

    fn with_params(&self, params: ChopZoneParams) -> Self {
        Self::new(params)
    }

    fn calculate(&self, series: &PriceSeries) -> Result<Evaluation, StratlabError> {
        let p = &self.params;
        let out = chop_zone(series, p.source, p.length, p.ema_length)?;

        let positions: Vec<Option<Position>> = out
            .zone
            .iter()
            .map(|z| z.map(|z| self.position(z)))
            .collect();

        let indicator_type = IndicatorType::ChopZone {
            length: p.length,
            ema_length: p.ema_length,
        };
        let zone_codes = out.zone_codes();
        let signal = out.zone.last().copied().flatten().and_then(strong_trend);
        Ok(Evaluation {
            indicators: vec![
                IndicatorSeries::new(indicator_type.clone(), "angle", out.angle),
                IndicatorSeries::new(indicator_type, "zone", zone_codes),
            ],
            signal,
            positions,
            returns_field: p.source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChopZoneGrid {
    pub length: Vec<usize>,
    pub ema_length: Vec<usize>,
}

impl SearchSpace for ChopZoneGrid {
    type Params = ChopZoneParams;

    fn axis_names(&self) -> Vec<&'static str> {
        vec!["length", "ema_length"]
    }

    fn axes(&self) -> Vec<&[usize]> {
        vec![self.length.as_slice(), self.ema_length.as_slice()]
    }

    fn params_at(&self, base: &ChopZoneParams, digits: &[usize]) -> ChopZoneParams {
        ChopZoneParams {
            length: self.length[digits[0]],
            ema_length: self.ema_length[digits[1]],
            ..base.clone()
        }
    }
}
