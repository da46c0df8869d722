#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Mutex;
use stratlab::domain::backtest::BacktestResult;
use stratlab::domain::error::StratlabError;
pub use stratlab::domain::ohlcv::{OhlcvBar, PriceSeries};
use stratlab::domain::strategy::{Evaluation, StrategyKind};
use stratlab::ports::data_port::DataPort;
use stratlab::ports::report_port::{RankingRow, ReportPort};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, StratlabError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratlabError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.timestamp.date() >= s))
                    .filter(|b| end_date.is_none_or(|e| b.timestamp.date() <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

/// Records what was written instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingReportPort {
    pub rankings: Mutex<Vec<(StrategyKind, Vec<String>, Vec<RankingRow>)>>,
    pub evaluations: Mutex<Vec<(usize, f64)>>,
}

impl ReportPort for RecordingReportPort {
    fn write_ranking(
        &self,
        strategy: StrategyKind,
        axis_names: &[&str],
        rows: &[RankingRow],
        _output: &std::path::Path,
    ) -> Result<(), StratlabError> {
        self.rankings.lock().unwrap().push((
            strategy,
            axis_names.iter().map(|s| s.to_string()).collect(),
            rows.to_vec(),
        ));
        Ok(())
    }

    fn write_evaluation(
        &self,
        series: &PriceSeries,
        _evaluation: &Evaluation,
        result: &BacktestResult,
        _output: &std::path::Path,
    ) -> Result<(), StratlabError> {
        self.evaluations
            .lock()
            .unwrap()
            .push((series.len(), result.terminal));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(0, 0, 0).unwrap()
}

/// Daily bars from `closes`, high/low one unit around the close.
pub fn bars_from_closes(start: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            timestamp: midnight(start + chrono::Duration::days(i as i64)),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// A drifting sine wave: trends and reversals for every strategy.
pub fn generate_bars(start: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            start_price + (t * 0.15).sin() * 10.0 + t * 0.05
        })
        .collect();
    bars_from_closes(start, &closes)
}

pub fn series(bars: Vec<OhlcvBar>) -> PriceSeries {
    PriceSeries::new(bars).unwrap()
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.date(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
