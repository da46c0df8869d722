//! Configuration validation.
//!
//! Builds the typed parameter records from a `ConfigPort`. Absent keys take
//! the documented defaults; a present but malformed value is a
//! `ConfigInvalid` error naming its section and key.

use crate::domain::correlation::DEFAULT_THRESHOLD;
use crate::domain::error::StratlabError;
use crate::domain::indicator::chop_zone::ChopZone;
use crate::domain::ohlcv::PriceField;
use crate::domain::optimizer::OptimizeOptions;
use crate::domain::strategy::{
    ChopZoneGrid, ChopZoneParams, MacdRsiBollingerGrid, MacdRsiBollingerParams, SqueezeDmiGrid,
    SqueezeDmiParams, StrategyConfig, StrategyKind,
};
use crate::ports::config_port::ConfigPort;
use std::fmt::Display;
use std::str::FromStr;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StratlabError {
    StratlabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_value<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, StratlabError>
where
    T: FromStr,
    T::Err: Display,
{
    config
        .get_string(section, key)
        .map(|raw| raw.parse::<T>().map_err(|e| invalid(section, key, format!("'{raw}': {e}"))))
        .transpose()
}

fn get_length(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StratlabError> {
    let value = parse_value(config, section, key)?.unwrap_or(default);
    if value == 0 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(value)
}

fn get_multiplier(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, StratlabError> {
    let value: f64 = parse_value(config, section, key)?.unwrap_or(default);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

fn get_ddof(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StratlabError> {
    let value = parse_value(config, section, key)?.unwrap_or(default);
    if value > 1 {
        return Err(invalid(section, key, "ddof must be 0 or 1"));
    }
    Ok(value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn get_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, StratlabError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => {
            parse_bool(&raw).ok_or_else(|| invalid(section, key, format!("'{raw}' is not a boolean")))
        }
    }
}

fn get_source(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<PriceField, StratlabError> {
    Ok(parse_value(config, section, key)?.unwrap_or_default())
}

/// Upper bound on the candidates of one optimisation axis.
pub const MAX_CANDIDATES: usize = 10_000;

/// Parse a candidate list: `a,b,c`, `start..=end` or `start..=end:step`,
/// or a comma-separated mix of both.
pub fn parse_candidates(text: &str) -> Result<Vec<usize>, String> {
    let mut values = Vec::new();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.split_once("..=") {
            Some((start, rest)) => {
                let (end, step) = match rest.split_once(':') {
                    Some((end, step)) => (end, step),
                    None => (rest, "1"),
                };
                let start: usize = start
                    .trim()
                    .parse()
                    .map_err(|e| format!("bad range start in '{item}': {e}"))?;
                let end: usize = end
                    .trim()
                    .parse()
                    .map_err(|e| format!("bad range end in '{item}': {e}"))?;
                let step: usize = step
                    .trim()
                    .parse()
                    .map_err(|e| format!("bad range step in '{item}': {e}"))?;
                if step == 0 {
                    return Err(format!("zero step in '{item}'"));
                }
                if start > end {
                    return Err(format!("empty range '{item}'"));
                }
                let count = (end - start) / step + 1;
                if values.len() + count > MAX_CANDIDATES {
                    return Err(format!(
                        "'{item}' expands past {MAX_CANDIDATES} candidates"
                    ));
                }
                values.extend((start..=end).step_by(step));
            }
            None => values.push(
                item.parse()
                    .map_err(|e| format!("bad candidate '{item}': {e}"))?,
            ),
        }
        if values.len() > MAX_CANDIDATES {
            return Err(format!("more than {MAX_CANDIDATES} candidates"));
        }
    }
    if values.is_empty() {
        return Err("no candidates".to_string());
    }
    if values.contains(&0) {
        return Err("candidates must be at least 1".to_string());
    }
    Ok(values)
}

fn get_candidates(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: impl FnOnce() -> Vec<usize>,
) -> Result<Vec<usize>, StratlabError> {
    match config.get_string(section, key) {
        None => Ok(default()),
        Some(raw) => parse_candidates(&raw).map_err(|reason| invalid(section, key, reason)),
    }
}

pub fn chop_zone_params(config: &dyn ConfigPort) -> Result<ChopZoneParams, StratlabError> {
    let section = StrategyKind::ChopZone.section();
    let defaults = ChopZoneParams::default();
    let active_zones = match config.get_string(section, "active_zones") {
        None => defaults.active_zones,
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>()
                    .ok()
                    .and_then(ChopZone::from_code)
                    .ok_or_else(|| invalid(section, "active_zones", format!("'{s}' is not a zone 0-8")))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(ChopZoneParams {
        length: get_length(config, section, "length", defaults.length)?,
        ema_length: get_length(config, section, "ema_length", defaults.ema_length)?,
        source: get_source(config, section, "source")?,
        active_zones,
    })
}

pub fn squeeze_dmi_params(config: &dyn ConfigPort) -> Result<SqueezeDmiParams, StratlabError> {
    let section = StrategyKind::SqueezeDmi.section();
    let d = SqueezeDmiParams::default();
    let mut params = SqueezeDmiParams {
        use_dmi: get_bool(config, section, "use_dmi", d.use_dmi)?,
        ..d.clone()
    };
    params.dmi.di_smoothing = get_length(config, section, "di_smoothing", d.dmi.di_smoothing)?;
    params.dmi.adx_length = get_length(config, section, "adx_length", d.dmi.adx_length)?;
    params.squeeze.bb_length = get_length(config, section, "bb_length", d.squeeze.bb_length)?;
    params.squeeze.bb_mult = get_multiplier(config, section, "bb_mult", d.squeeze.bb_mult)?;
    params.squeeze.bb_ddof = get_ddof(config, section, "bb_ddof", d.squeeze.bb_ddof)?;
    params.squeeze.kc_length = get_length(config, section, "kc_length", d.squeeze.kc_length)?;
    params.squeeze.kc_mult = get_multiplier(config, section, "kc_mult", d.squeeze.kc_mult)?;
    params.squeeze.momentum_periods =
        get_length(config, section, "momentum_periods", d.squeeze.momentum_periods)?;
    params.squeeze.momentum_length =
        get_length(config, section, "momentum_length", d.squeeze.momentum_length)?;
    params.squeeze.source = get_source(config, section, "source")?;
    Ok(params)
}

pub fn macd_rsi_bollinger_params(
    config: &dyn ConfigPort,
) -> Result<MacdRsiBollingerParams, StratlabError> {
    let section = StrategyKind::MacdRsiBollinger.section();
    let mut params = MacdRsiBollingerParams::default();
    params.rsi.length = get_length(config, section, "rsi_length", params.rsi.length)?;
    params.rsi.source = get_source(config, section, "rsi_source")?;
    params.bollinger.length = get_length(config, section, "bb_length", params.bollinger.length)?;
    params.bollinger.mult = get_multiplier(config, section, "bb_mult", params.bollinger.mult)?;
    params.bollinger.ddof = get_ddof(config, section, "bb_ddof", params.bollinger.ddof)?;
    params.bollinger.source = get_source(config, section, "bb_source")?;
    params.macd.fast = get_length(config, section, "macd_fast", params.macd.fast)?;
    params.macd.slow = get_length(config, section, "macd_slow", params.macd.slow)?;
    params.macd.signal = get_length(config, section, "macd_signal", params.macd.signal)?;
    params.macd.source = get_source(config, section, "macd_source")?;
    if params.macd.fast >= params.macd.slow {
        return Err(invalid(section, "macd_fast", "macd_fast must be below macd_slow"));
    }
    Ok(params)
}

pub fn strategy_config(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<StrategyConfig, StratlabError> {
    Ok(match kind {
        StrategyKind::ChopZone => StrategyConfig::ChopZone(chop_zone_params(config)?),
        StrategyKind::SqueezeDmi => StrategyConfig::SqueezeDmi(squeeze_dmi_params(config)?),
        StrategyKind::MacdRsiBollinger => {
            StrategyConfig::MacdRsiBollinger(macd_rsi_bollinger_params(config)?)
        }
    })
}

pub fn optimize_options(config: &dyn ConfigPort) -> Result<OptimizeOptions, StratlabError> {
    let defaults = OptimizeOptions::default();
    let max_trials = get_length(config, "optimize", "max_trials", defaults.max_trials)?;
    let seed = parse_value(config, "optimize", "seed")?;
    let threads = match parse_value::<usize>(config, "optimize", "threads")? {
        Some(0) => return Err(invalid("optimize", "threads", "threads must be at least 1")),
        other => other,
    };
    Ok(OptimizeOptions {
        max_trials,
        seed,
        threads,
    })
}

fn grid_section(kind: StrategyKind) -> String {
    format!("optimize.{}", kind.section())
}

pub fn chop_zone_grid(config: &dyn ConfigPort) -> Result<ChopZoneGrid, StratlabError> {
    let section = grid_section(StrategyKind::ChopZone);
    Ok(ChopZoneGrid {
        length: get_candidates(config, &section, "length", || (10..=100).collect())?,
        ema_length: get_candidates(config, &section, "ema_length", || (10..=100).collect())?,
    })
}

/// DMI axes default to 9..=21 only when DMI confirmation is enabled.
pub fn squeeze_dmi_grid(
    config: &dyn ConfigPort,
    params: &SqueezeDmiParams,
) -> Result<SqueezeDmiGrid, StratlabError> {
    let section = grid_section(StrategyKind::SqueezeDmi);
    let dmi_default = || {
        if params.use_dmi {
            (9..=21).collect()
        } else {
            Vec::new()
        }
    };
    Ok(SqueezeDmiGrid {
        bb_length: get_candidates(config, &section, "bb_length", || {
            (10..=100).step_by(10).collect()
        })?,
        kc_length: get_candidates(config, &section, "kc_length", || {
            (10..=100).step_by(10).collect()
        })?,
        di_smoothing: get_candidates(config, &section, "di_smoothing", dmi_default)?,
        adx_length: get_candidates(config, &section, "adx_length", dmi_default)?,
    })
}

pub fn macd_rsi_bollinger_grid(
    config: &dyn ConfigPort,
) -> Result<MacdRsiBollingerGrid, StratlabError> {
    let section = grid_section(StrategyKind::MacdRsiBollinger);
    Ok(MacdRsiBollingerGrid {
        rsi_length: get_candidates(config, &section, "rsi_length", || (9..=21).collect())?,
        bb_length: get_candidates(config, &section, "bb_length", || (9..=49).collect())?,
        macd_fast: get_candidates(config, &section, "macd_fast", || (9..=14).collect())?,
        macd_slow: get_candidates(config, &section, "macd_slow", || (21..=30).collect())?,
        macd_signal: get_candidates(config, &section, "macd_signal", || (9..=14).collect())?,
    })
}

pub fn screen_threshold(config: &dyn ConfigPort) -> Result<f64, StratlabError> {
    let value: f64 = parse_value(config, "screen", "threshold")?.unwrap_or(DEFAULT_THRESHOLD);
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid("screen", "threshold", "threshold must be between 0 and 1"));
    }
    Ok(value)
}

/// Validate every section the CLI reads. Used by `validate`.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), StratlabError> {
    let squeeze = squeeze_dmi_params(config)?;
    chop_zone_params(config)?;
    macd_rsi_bollinger_params(config)?;
    optimize_options(config)?;
    chop_zone_grid(config)?;
    squeeze_dmi_grid(config, &squeeze)?;
    macd_rsi_bollinger_grid(config)?;
    screen_threshold(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(err: StratlabError) -> String {
        match err {
            StratlabError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = FileConfigAdapter::empty();
        assert_eq!(chop_zone_params(&config).unwrap(), ChopZoneParams::default());
        assert_eq!(squeeze_dmi_params(&config).unwrap(), SqueezeDmiParams::default());
        assert_eq!(
            macd_rsi_bollinger_params(&config).unwrap(),
            MacdRsiBollingerParams::default()
        );
        assert_eq!(optimize_options(&config).unwrap(), OptimizeOptions::default());
        assert_eq!(screen_threshold(&config).unwrap(), 0.5);
        assert!(validate_all(&config).is_ok());
    }

    #[test]
    fn chop_zone_section_is_read() {
        let config = make_config(
            "[chop_zone]\nlength = 20\nema_length = 25\nsource = hl\nactive_zones = 0, 1, 4\n",
        );
        let err = chop_zone_params(&config).unwrap_err();
        assert_eq!(invalid_key(err), "source");

        let config = make_config(
            "[chop_zone]\nlength = 20\nema_length = 25\nsource = high\nactive_zones = 0, 1, 4\n",
        );
        let p = chop_zone_params(&config).unwrap();
        assert_eq!(p.length, 20);
        assert_eq!(p.ema_length, 25);
        assert_eq!(p.source, PriceField::High);
        assert_eq!(
            p.active_zones,
            vec![
                ChopZone::StrongBullish,
                ChopZone::ModerateBullish,
                ChopZone::StrongBearish
            ]
        );
    }

    #[test]
    fn bad_zone_code_rejected() {
        let config = make_config("[chop_zone]\nactive_zones = 0, 9\n");
        assert_eq!(invalid_key(chop_zone_params(&config).unwrap_err()), "active_zones");
    }

    #[test]
    fn zero_length_rejected() {
        let config = make_config("[squeeze_dmi]\nbb_length = 0\n");
        assert_eq!(invalid_key(squeeze_dmi_params(&config).unwrap_err()), "bb_length");
    }

    #[test]
    fn non_numeric_length_rejected() {
        let config = make_config("[macd_rsi_bollinger]\nrsi_length = abc\n");
        assert_eq!(
            invalid_key(macd_rsi_bollinger_params(&config).unwrap_err()),
            "rsi_length"
        );
    }

    #[test]
    fn macd_fast_must_be_below_slow() {
        let config = make_config("[macd_rsi_bollinger]\nmacd_fast = 30\n");
        assert_eq!(
            invalid_key(macd_rsi_bollinger_params(&config).unwrap_err()),
            "macd_fast"
        );
    }

    #[test]
    fn squeeze_use_dmi_bool() {
        let config = make_config("[squeeze_dmi]\nuse_dmi = no\nkc_mult = 1.2\n");
        let p = squeeze_dmi_params(&config).unwrap();
        assert!(!p.use_dmi);
        assert_eq!(p.squeeze.kc_mult, 1.2);

        let config = make_config("[squeeze_dmi]\nuse_dmi = maybe\n");
        assert_eq!(invalid_key(squeeze_dmi_params(&config).unwrap_err()), "use_dmi");
    }

    #[test]
    fn negative_multiplier_rejected() {
        let config = make_config("[squeeze_dmi]\nbb_mult = -1\n");
        assert_eq!(invalid_key(squeeze_dmi_params(&config).unwrap_err()), "bb_mult");
    }

    #[test]
    fn candidates_list_and_range() {
        assert_eq!(parse_candidates("5, 10, 15").unwrap(), vec![5, 10, 15]);
        assert_eq!(parse_candidates("10..=30:10").unwrap(), vec![10, 20, 30]);
        assert_eq!(parse_candidates("3..=5").unwrap(), vec![3, 4, 5]);
        assert_eq!(parse_candidates("2, 4..=6:2").unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn candidates_errors() {
        assert!(parse_candidates("").is_err());
        assert!(parse_candidates("5..=3").is_err());
        assert!(parse_candidates("1..=3:0").is_err());
        assert!(parse_candidates("0, 1").is_err());
        assert!(parse_candidates("x").is_err());
    }

    #[test]
    fn candidates_huge_range_is_rejected() {
        let err = parse_candidates("1..=10000000000").unwrap_err();
        assert!(err.contains("10000 candidates"), "{err}");
        assert_eq!(parse_candidates("1..=10000").unwrap().len(), MAX_CANDIDATES);
        assert!(parse_candidates("1..=10000, 5..=6").is_err());
        assert!(parse_candidates("1..=10000, 7").is_err());
        let config = make_config("[optimize.chop_zone]\nlength = 1..=20000\n");
        assert!(matches!(
            chop_zone_grid(&config),
            Err(StratlabError::ConfigInvalid { ref key, .. }) if key == "length"
        ));
    }

    #[test]
    fn default_grids_match_sweeps() {
        let config = FileConfigAdapter::empty();
        let chop = chop_zone_grid(&config).unwrap();
        assert_eq!(chop.length.len(), 91);
        assert_eq!(chop.ema_length.first(), Some(&10));

        let squeeze = squeeze_dmi_grid(&config, &SqueezeDmiParams::default()).unwrap();
        assert_eq!(squeeze.bb_length, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        assert_eq!(squeeze.di_smoothing.len(), 13);

        let no_dmi = SqueezeDmiParams {
            use_dmi: false,
            ..SqueezeDmiParams::default()
        };
        let squeeze = squeeze_dmi_grid(&config, &no_dmi).unwrap();
        assert!(squeeze.di_smoothing.is_empty());
        assert!(squeeze.adx_length.is_empty());

        let macd = macd_rsi_bollinger_grid(&config).unwrap();
        assert_eq!(macd.macd_slow, (21..=30).collect::<Vec<_>>());
    }

    #[test]
    fn grid_section_overrides() {
        let config = make_config("[optimize.chop_zone]\nlength = 5, 10\nema_length = 6..=8\n");
        let grid = chop_zone_grid(&config).unwrap();
        assert_eq!(grid.length, vec![5, 10]);
        assert_eq!(grid.ema_length, vec![6, 7, 8]);

        let config = make_config("[optimize.chop_zone]\nlength = 10..=5\n");
        assert_eq!(invalid_key(chop_zone_grid(&config).unwrap_err()), "length");
    }

    #[test]
    fn optimize_section() {
        let config = make_config("[optimize]\nmax_trials = 250\nseed = 42\nthreads = 4\n");
        assert_eq!(
            optimize_options(&config).unwrap(),
            OptimizeOptions {
                max_trials: 250,
                seed: Some(42),
                threads: Some(4),
            }
        );
        let config = make_config("[optimize]\nthreads = 0\n");
        assert_eq!(invalid_key(optimize_options(&config).unwrap_err()), "threads");
        let config = make_config("[optimize]\nmax_trials = 0\n");
        assert_eq!(invalid_key(optimize_options(&config).unwrap_err()), "max_trials");
    }

    #[test]
    fn screen_threshold_range() {
        let config = make_config("[screen]\nthreshold = 0.3\n");
        assert_eq!(screen_threshold(&config).unwrap(), 0.3);
        let config = make_config("[screen]\nthreshold = 1.5\n");
        assert_eq!(invalid_key(screen_threshold(&config).unwrap_err()), "threshold");
    }

    #[test]
    fn strategy_config_by_kind() {
        let config = make_config("[chop_zone]\nlength = 12\n");
        match strategy_config(&config, StrategyKind::ChopZone).unwrap() {
            StrategyConfig::ChopZone(p) => assert_eq!(p.length, 12),
            other => panic!("unexpected {other:?}"),
        }
    }
}
