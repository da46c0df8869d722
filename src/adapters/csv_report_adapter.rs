//! CSV report adapter: optimizer rankings and per-bar evaluation dumps.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratlabError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::position_codes;
use crate::domain::strategy::{Evaluation, StrategyKind};
use crate::ports::report_port::{RankingRow, ReportPort};
use std::path::Path;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

fn csv_error(path: &Path, e: csv::Error) -> StratlabError {
    StratlabError::Data {
        reason: format!("failed to write {}: {e}", path.display()),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn write_ranking(
        &self,
        strategy: StrategyKind,
        axis_names: &[&str],
        rows: &[RankingRow],
        output: &Path,
    ) -> Result<(), StratlabError> {
        let mut wtr = csv::Writer::from_path(output).map_err(|e| csv_error(output, e))?;

        let mut header = vec!["strategy", "rank"];
        header.extend_from_slice(axis_names);
        header.push("terminal_return");
        wtr.write_record(&header).map_err(|e| csv_error(output, e))?;

        for row in rows {
            let mut record = vec![strategy.to_string(), row.rank.to_string()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            record.push(row.terminal.to_string());
            wtr.write_record(&record).map_err(|e| csv_error(output, e))?;
        }
        wtr.flush()?;
        tracing::info!(path = %output.display(), rows = rows.len(), "wrote ranking");
        Ok(())
    }

    fn write_evaluation(
        &self,
        series: &PriceSeries,
        evaluation: &Evaluation,
        result: &BacktestResult,
        output: &Path,
    ) -> Result<(), StratlabError> {
        let bars = series.bars();
        if evaluation.positions.len() != bars.len() {
            return Err(StratlabError::LengthMismatch {
                expected: bars.len(),
                actual: evaluation.positions.len(),
            });
        }
        let mut wtr = csv::Writer::from_path(output).map_err(|e| csv_error(output, e))?;

        let mut header = vec!["timestamp".to_string(), "close".to_string()];
        header.extend(evaluation.indicators.iter().map(|s| s.label()));
        header.push("position".to_string());
        header.push("cumulative".to_string());
        wtr.write_record(&header).map_err(|e| csv_error(output, e))?;

        let positions = position_codes(&evaluation.positions);
        for (i, bar) in bars.iter().enumerate() {
            let mut record = vec![bar.timestamp.to_string(), bar.close.to_string()];
            record.extend(
                evaluation
                    .indicators
                    .iter()
                    .map(|s| cell(s.values.get(i).copied().flatten())),
            );
            record.push(cell(positions[i]));
            record.push(cell(result.cumulative.get(i).copied()));
            wtr.write_record(&record).map_err(|e| csv_error(output, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorSeries, IndicatorType};
    use crate::domain::ohlcv::{OhlcvBar, PriceField};
    use crate::domain::signal::Position;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ranking_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranking.csv");
        let rows = vec![
            RankingRow {
                rank: 1,
                values: vec![10, 5],
                terminal: 1.5,
            },
            RankingRow {
                rank: 2,
                values: vec![20, 5],
                terminal: 1.2,
            },
        ];
        CsvReportAdapter
            .write_ranking(
                StrategyKind::ChopZone,
                &["length", "ema_length"],
                &rows,
                &path,
            )
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "strategy,rank,length,ema_length,terminal_return");
        assert_eq!(lines[1], "chop-zone,1,10,5,1.5");
        assert_eq!(lines[2], "chop-zone,2,20,5,1.2");
    }

    #[test]
    fn evaluation_leaves_undefined_cells_blank() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eval.csv");
        let bars: Vec<OhlcvBar> = (0..2)
            .map(|i| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1 + i)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 1.0,
            })
            .collect();
        let series = PriceSeries::new(bars).unwrap();
        let evaluation = Evaluation {
            indicators: vec![IndicatorSeries::new(
                IndicatorType::Rsi(2),
                "value",
                vec![None, Some(10.0)],
            )],
            positions: vec![None, Some(Position::Long)],
            signal: None,
            returns_field: PriceField::Close,
        };
        let result = BacktestResult {
            cumulative: vec![1.0, 1.0],
            terminal: 1.0,
        };
        CsvReportAdapter
            .write_evaluation(&series, &evaluation, &result, &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,close,RSI(2).value,position,cumulative");
        assert_eq!(lines[1], "2024-01-01 00:00:00,10,,,1");
        assert_eq!(lines[2], "2024-01-02 00:00:00,10,10,1,1");
    }
}
