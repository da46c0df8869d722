//! Close-price correlation screen across symbols.

use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Pearson correlation of two equally long samples.
///
/// `None` with fewer than two points or when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

/// Correlation of closes on the timestamps both series share.
pub fn close_correlation(a: &PriceSeries, b: &PriceSeries) -> Option<f64> {
    let by_time: HashMap<NaiveDateTime, f64> =
        b.bars().iter().map(|bar| (bar.timestamp, bar.close)).collect();
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .bars()
        .iter()
        .filter_map(|bar| by_time.get(&bar.timestamp).map(|&c| (bar.close, c)))
        .unzip();
    pearson(&xs, &ys)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenEntry {
    pub symbol: String,
    /// Symbols whose absolute correlation with `symbol` is below the threshold.
    pub uncorrelated: Vec<(String, f64)>,
}

/// For every symbol, list the others it is weakly correlated with.
///
/// Pairs with an undefined correlation are left out.
pub fn screen(series: &[(String, PriceSeries)], threshold: f64) -> Vec<ScreenEntry> {
    let n = series.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = close_correlation(&series[i].1, &series[j].1);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    series
        .iter()
        .enumerate()
        .map(|(i, (symbol, _))| ScreenEntry {
            symbol: symbol.clone(),
            uncorrelated: series
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .filter_map(|(j, (other, _))| {
                    matrix[i][j]
                        .filter(|r: &f64| r.abs() < threshold)
                        .map(|r| (other.clone(), r))
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(start_day: i64, closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(start_day + i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn aligns_on_common_timestamps() {
        let a = make_series(0, &[1.0, 2.0, 3.0, 4.0]);
        // overlaps a on days 2 and 3 only
        let b = make_series(2, &[30.0, 40.0, 99.0]);
        assert_relative_eq!(close_correlation(&a, &b).unwrap(), 1.0);

        let c = make_series(10, &[1.0, 2.0]);
        assert_eq!(close_correlation(&a, &c), None);
    }

    #[test]
    fn screen_lists_weak_pairs() {
        let up = make_series(0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let also_up = make_series(0, &[2.0, 4.0, 6.0, 8.0, 10.0]);
        let zigzag = make_series(0, &[1.0, 3.0, 1.0, 3.0, 1.0]);
        let entries = screen(
            &[
                ("AAA".to_string(), up),
                ("BBB".to_string(), also_up),
                ("CCC".to_string(), zigzag),
            ],
            DEFAULT_THRESHOLD,
        );
        assert_eq!(entries.len(), 3);
        let names: Vec<&str> = entries[0].uncorrelated.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["CCC"]);
        let names: Vec<&str> = entries[2].uncorrelated.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["AAA", "BBB"]);
    }
}
