//! Performance metrics over a cumulative-return curve.

use crate::domain::backtest::BacktestResult;
use crate::domain::signal::Position;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Bar index of the peak preceding the deepest drawdown.
    pub drawdown_peak: usize,
    /// Bar index of the deepest drawdown trough.
    pub drawdown_trough: usize,
    pub max_drawdown_duration: usize,
    /// Fraction of bars holding a long or short position.
    pub exposure: f64,
}

impl Metrics {
    pub fn compute(
        result: &BacktestResult,
        positions: &[Option<Position>],
        periods_per_year: f64,
        risk_free_rate: f64,
    ) -> Self {
        let curve = &result.cumulative;
        let start = curve.first().copied().unwrap_or(1.0);

        let total_return = if start > 0.0 {
            result.terminal / start - 1.0
        } else {
            0.0
        };

        let periods = curve.len().saturating_sub(1) as f64;
        let years = periods / periods_per_year;
        let annualized_return = if years > 0.0 && total_return > -1.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let drawdown = compute_drawdown(curve);

        let period_rf = risk_free_rate / periods_per_year;
        let risk = compute_risk_adjusted(curve, period_rf, periods_per_year);

        let exposure = if positions.is_empty() {
            0.0
        } else {
            let held = positions
                .iter()
                .filter(|p| matches!(p, Some(Position::Long) | Some(Position::Short)))
                .count();
            held as f64 / positions.len() as f64
        };

        Metrics {
            total_return,
            annualized_return,
            volatility: risk.volatility,
            sharpe_ratio: risk.sharpe,
            sortino_ratio: risk.sortino,
            max_drawdown: drawdown.max_drawdown,
            drawdown_peak: drawdown.peak,
            drawdown_trough: drawdown.trough,
            max_drawdown_duration: drawdown.duration,
            exposure,
        }
    }
}

#[derive(Debug, Default)]
struct Drawdown {
    max_drawdown: f64,
    peak: usize,
    trough: usize,
    duration: usize,
}

fn compute_drawdown(curve: &[f64]) -> Drawdown {
    let mut out = Drawdown::default();
    let Some(&first) = curve.first() else {
        return out;
    };

    let mut peak = first;
    let mut peak_index = 0usize;
    let mut current_duration = 0usize;

    for (i, &value) in curve.iter().enumerate() {
        if value > peak {
            peak = value;
            peak_index = i;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > out.max_drawdown {
                out.max_drawdown = dd;
                out.peak = peak_index;
                out.trough = i;
            }
            if value < peak {
                current_duration += 1;
                out.duration = out.duration.max(current_duration);
            }
        }
    }

    out
}

struct RiskAdjusted {
    volatility: f64,
    sharpe: f64,
    sortino: f64,
}

fn compute_risk_adjusted(curve: &[f64], period_rf: f64, periods_per_year: f64) -> RiskAdjusted {
    let zero = RiskAdjusted {
        volatility: 0.0,
        sharpe: 0.0,
        sortino: 0.0,
    };
    if curve.len() < 2 {
        return zero;
    }

    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let annualizer = periods_per_year.sqrt();

    let excess_return = mean - period_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * annualizer
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < period_rf)
        .map(|&r| (r - period_rf).powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * annualizer
    } else {
        0.0
    };

    RiskAdjusted {
        volatility: stddev * annualizer,
        sharpe,
        sortino,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn result(curve: &[f64]) -> BacktestResult {
        BacktestResult {
            cumulative: curve.to_vec(),
            terminal: *curve.last().unwrap(),
        }
    }

    #[test]
    fn metrics_total_return() {
        let m = Metrics::compute(&result(&[1.0, 1.1, 1.2]), &[], TRADING_DAYS_PER_YEAR, 0.0);
        assert_relative_eq!(m.total_return, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn metrics_annualized_return_one_year() {
        let mut curve = vec![1.0; 253];
        curve[252] = 1.1;
        let m = Metrics::compute(&result(&curve), &[], TRADING_DAYS_PER_YEAR, 0.0);
        assert_relative_eq!(m.annualized_return, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn metrics_max_drawdown() {
        let m = Metrics::compute(
            &result(&[1.0, 1.2, 0.9, 1.0, 1.3]),
            &[],
            TRADING_DAYS_PER_YEAR,
            0.0,
        );
        assert_relative_eq!(m.max_drawdown, 0.25, epsilon = 1e-12);
        assert_eq!(m.drawdown_peak, 1);
        assert_eq!(m.drawdown_trough, 2);
        assert_eq!(m.max_drawdown_duration, 2);
    }

    #[test]
    fn metrics_flat_curve() {
        let m = Metrics::compute(&result(&[1.0, 1.0, 1.0]), &[], TRADING_DAYS_PER_YEAR, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn metrics_sharpe_positive_for_rising_curve() {
        let m = Metrics::compute(
            &result(&[1.0, 1.01, 1.03, 1.04, 1.07]),
            &[],
            TRADING_DAYS_PER_YEAR,
            0.0,
        );
        assert!(m.sharpe_ratio > 0.0);
        assert!(m.volatility > 0.0);
        // no losing period
        assert_eq!(m.sortino_ratio, 0.0);
    }

    #[test]
    fn metrics_exposure() {
        let positions = [
            None,
            Some(Position::Flat),
            Some(Position::Long),
            Some(Position::Short),
        ];
        let m = Metrics::compute(
            &result(&[1.0, 1.0, 1.0, 1.0]),
            &positions,
            TRADING_DAYS_PER_YEAR,
            0.0,
        );
        assert_relative_eq!(m.exposure, 0.5);
    }
}
