//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row naming
//! `Date` (or `Datetime`), `Open`, `High`, `Low`, `Close` and `Volume`.
//! Header matching is case-insensitive; other columns such as `Adj Close`
//! are ignored.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, StratlabError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| StratlabError::Data {
                    reason: format!("missing {} column", names[0]),
                })
        };
        Ok(Self {
            timestamp: find(&["date", "datetime"])?,
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            volume: find(&["volume"])?,
        })
    }
}

/// Date-only values are read as midnight; a trailing UTC offset is dropped.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"]
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.naive_local())
        })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, StratlabError> {
    let raw = record.get(index).ok_or_else(|| StratlabError::Data {
        reason: format!("line {line}: missing {name} value"),
    })?;
    raw.trim().parse().map_err(|e| StratlabError::Data {
        reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
    })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, StratlabError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StratlabError::NoData {
                symbol: symbol.to_string(),
            },
            _ => StratlabError::Io(e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| StratlabError::Data {
            reason: format!("{}: {e}", path.display()),
        })?;
        let columns = Columns::from_headers(headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StratlabError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_time = record.get(columns.timestamp).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time).ok_or_else(|| StratlabError::Data {
                reason: format!("line {line}: invalid timestamp '{raw_time}'"),
            })?;

            let date = timestamp.date();
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(OhlcvBar {
                timestamp,
                open: parse_field(&record, columns.open, "open", line)?,
                high: parse_field(&record, columns.high, "high", line)?,
                low: parse_field(&record, columns.low, "low", line)?,
                close: parse_field(&record, columns.close, "close", line)?,
                volume: parse_field(&record, columns.volume, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(symbol, bars = bars.len(), "loaded price data");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
