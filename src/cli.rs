//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestResult;
use crate::domain::config_validation::{
    self, chop_zone_grid, macd_rsi_bollinger_grid, optimize_options, screen_threshold,
    squeeze_dmi_grid, strategy_config,
};
use crate::domain::correlation::{self, ScreenEntry};
use crate::domain::error::StratlabError;
use crate::domain::metrics::{Metrics, TRADING_DAYS_PER_YEAR};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::optimizer::{self, OptimizationReport, OptimizeOptions};
use crate::domain::signal::Trend;
use crate::domain::strategy::{
    evaluate_all, ChopZoneStrategy, Evaluation, MacdRsiBollingerStrategy, SqueezeDmiStrategy,
    Strategy, StrategyConfig, StrategyKind,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{RankingRow, ReportPort};

#[derive(Parser, Debug)]
#[command(
    name = "stratlab",
    about = "Strategy evaluation and parameter optimisation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory holding one <SYMBOL>.csv per symbol
    #[arg(short, long)]
    pub data: PathBuf,
    /// First date to load (inclusive)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last date to load (inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate strategies on one symbol and backtest them
    Evaluate {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        symbol: String,
        /// Strategies to run (default: all)
        #[arg(short, long = "strategy")]
        strategies: Vec<StrategyKind>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Per-bar CSV dump; requires exactly one strategy
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 0.0)]
        risk_free_rate: f64,
    },
    /// Search a strategy's parameter grid
    Optimize {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: StrategyKind,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        max_trials: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        threads: Option<usize>,
        /// Rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Write the full ranking as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Latest signal of every strategy for each symbol (one pass)
    Signals {
        #[command(flatten)]
        data: DataArgs,
        /// Symbols to scan (default: every CSV in the data directory)
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List weakly correlated symbol pairs
    Screen {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default
/// `stratlab=info`; repeated calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stratlab=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_error(e: &StratlabError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

fn finish(result: Result<(), StratlabError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();
    match cli.command {
        Command::Evaluate {
            data,
            symbol,
            strategies,
            config,
            output,
            risk_free_rate,
        } => finish(run_evaluate(
            &data,
            &symbol,
            &strategies,
            config.as_deref(),
            output.as_deref(),
            risk_free_rate,
        )),
        Command::Optimize {
            data,
            symbol,
            strategy,
            config,
            max_trials,
            seed,
            threads,
            top,
            output,
        } => finish(run_optimize(
            &data,
            &symbol,
            strategy,
            config.as_deref(),
            OptimizeOverrides {
                max_trials,
                seed,
                threads,
            },
            top,
            output.as_deref(),
        )),
        Command::Signals {
            data,
            symbols,
            config,
        } => finish(run_signals(&data, &symbols, config.as_deref())),
        Command::Screen {
            data,
            symbols,
            config,
            threshold,
        } => finish(run_screen(&data, &symbols, config.as_deref(), threshold)),
        Command::Validate { config } => finish(run_validate(&config)),
    }
}

/// Load an INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, StratlabError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn load_series(
    data_port: &dyn DataPort,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, StratlabError> {
    let bars = data_port.fetch_ohlcv(symbol, start, end)?;
    if bars.is_empty() {
        return Err(StratlabError::NoData {
            symbol: symbol.to_string(),
        });
    }
    PriceSeries::new(bars)
}

/// Symbols given on the command line, or every symbol the data port knows.
pub fn resolve_symbols(
    data_port: &dyn DataPort,
    symbols: &[String],
) -> Result<Vec<String>, StratlabError> {
    let explicit: Vec<String> = symbols
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    let listed = data_port.list_symbols()?;
    if listed.is_empty() {
        return Err(StratlabError::NoData {
            symbol: "*".to_string(),
        });
    }
    Ok(listed)
}

/// The ports a pipeline runs against.
#[derive(Clone, Copy)]
pub struct Ports<'a> {
    pub data: &'a dyn DataPort,
    pub report: &'a dyn ReportPort,
    pub config: &'a dyn ConfigPort,
}

pub fn build_configs(
    config: &dyn ConfigPort,
    kinds: &[StrategyKind],
) -> Result<Vec<StrategyConfig>, StratlabError> {
    let kinds: &[StrategyKind] = if kinds.is_empty() {
        &StrategyKind::ALL
    } else {
        kinds
    };
    kinds.iter().map(|&k| strategy_config(config, k)).collect()
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub evaluation: Evaluation,
    pub result: BacktestResult,
    pub metrics: Metrics,
}

/// Calculate, backtest and score every configured strategy on `series`.
pub fn evaluate_series(
    series: &PriceSeries,
    configs: &[StrategyConfig],
    risk_free_rate: f64,
) -> Vec<(StrategyKind, Result<StrategyReport, StratlabError>)> {
    evaluate_all(configs, series)
        .into_iter()
        .map(|(kind, outcome)| {
            let report = outcome.and_then(|evaluation| {
                let result = evaluation.backtest(series)?;
                let metrics = Metrics::compute(
                    &result,
                    &evaluation.positions,
                    TRADING_DAYS_PER_YEAR,
                    risk_free_rate,
                );
                Ok(StrategyReport {
                    kind,
                    evaluation,
                    result,
                    metrics,
                })
            });
            (kind, report)
        })
        .collect()
}

fn signal_label(signal: Option<Trend>) -> String {
    signal.map_or_else(|| "-".to_string(), |t| t.to_string())
}

pub fn run_evaluate_pipeline(
    ports: Ports<'_>,
    data: &DataArgs,
    symbol: &str,
    kinds: &[StrategyKind],
    output: Option<&Path>,
    risk_free_rate: f64,
) -> Result<Vec<(StrategyKind, Result<StrategyReport, StratlabError>)>, StratlabError> {
    if output.is_some() && kinds.len() != 1 {
        return Err(StratlabError::invalid_parameter(
            "output",
            "--output needs exactly one --strategy",
        ));
    }
    let configs = build_configs(ports.config, kinds)?;
    let series = load_series(ports.data, symbol, data.start, data.end)?;
    tracing::info!(symbol, bars = series.len(), "evaluating");

    let reports = evaluate_series(&series, &configs, risk_free_rate);
    if let Some(path) = output {
        match reports.first() {
            Some((_, Ok(r))) => ports.report.write_evaluation(&series, &r.evaluation, &r.result, path)?,
            Some((kind, Err(e))) => {
                return Err(StratlabError::Data {
                    reason: format!("{kind} produced no evaluation to write: {e}"),
                });
            }
            None => {}
        }
    }
    Ok(reports)
}

fn run_evaluate(
    data: &DataArgs,
    symbol: &str,
    kinds: &[StrategyKind],
    config_path: Option<&Path>,
    output: Option<&Path>,
    risk_free_rate: f64,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(data.data.clone());
    let ports = Ports {
        data: &data_port,
        report: &CsvReportAdapter,
        config: &config,
    };
    let reports = run_evaluate_pipeline(
        ports,
        data,
        symbol,
        kinds,
        output,
        risk_free_rate,
    )?;

    println!("=== {symbol} ===");
    for (kind, outcome) in &reports {
        match outcome {
            Ok(r) => println!(
                "{:<20} signal: {:<8} terminal: {:.4}  return: {:.2}%  sharpe: {:.2}  max dd: -{:.1}%  exposure: {:.1}%",
                kind.as_str(),
                signal_label(r.evaluation.signal),
                r.result.terminal,
                r.metrics.total_return * 100.0,
                r.metrics.sharpe_ratio,
                r.metrics.max_drawdown * 100.0,
                r.metrics.exposure * 100.0,
            ),
            Err(e) => println!("{:<20} error: {e}", kind.as_str()),
        }
    }
    if let Some(path) = output {
        eprintln!("Evaluation written to: {}", path.display());
    }

    // Every strategy failing is a failure of the command.
    if reports.iter().all(|(_, r)| r.is_err()) {
        if let Some((_, Err(e))) = reports.into_iter().next() {
            return Err(e);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// optimize
// ---------------------------------------------------------------------------

/// Command-line values that take precedence over `[optimize]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeOverrides {
    pub max_trials: Option<usize>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

impl OptimizeOverrides {
    pub fn apply(self, options: OptimizeOptions) -> OptimizeOptions {
        OptimizeOptions {
            max_trials: self.max_trials.unwrap_or(options.max_trials),
            seed: self.seed.or(options.seed),
            threads: self.threads.or(options.threads),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankingTable {
    pub kind: StrategyKind,
    pub axis_names: Vec<&'static str>,
    pub rows: Vec<RankingRow>,
    pub failures: usize,
    pub combinations: usize,
    pub sampled: bool,
}

impl RankingTable {
    fn from_report<P>(kind: StrategyKind, report: &OptimizationReport<P>) -> Self {
        Self {
            kind,
            axis_names: report.axis_names.clone(),
            rows: report
                .ranked
                .iter()
                .enumerate()
                .map(|(i, t)| RankingRow {
                    rank: i + 1,
                    values: t.values.clone(),
                    terminal: t.terminal,
                })
                .collect(),
            failures: report.failures.len(),
            combinations: report.combinations,
            sampled: report.sampled,
        }
    }
}

fn search<S: Strategy>(
    kind: StrategyKind,
    strategy: S,
    grid: &S::Grid,
    series: &PriceSeries,
    options: &OptimizeOptions,
) -> Result<RankingTable, StratlabError> {
    let report = optimizer::optimize(&strategy, grid, series, options)?;
    Ok(RankingTable::from_report(kind, &report))
}

/// Run the configured grid of `kind` around its configured parameters.
pub fn optimize_series(
    config: &dyn ConfigPort,
    kind: StrategyKind,
    series: &PriceSeries,
    options: &OptimizeOptions,
) -> Result<RankingTable, StratlabError> {
    match strategy_config(config, kind)? {
        StrategyConfig::ChopZone(p) => {
            let grid = chop_zone_grid(config)?;
            search(kind, ChopZoneStrategy::new(p), &grid, series, options)
        }
        StrategyConfig::SqueezeDmi(p) => {
            let grid = squeeze_dmi_grid(config, &p)?;
            search(kind, SqueezeDmiStrategy::new(p), &grid, series, options)
        }
        StrategyConfig::MacdRsiBollinger(p) => {
            let grid = macd_rsi_bollinger_grid(config)?;
            search(kind, MacdRsiBollingerStrategy::new(p), &grid, series, options)
        }
    }
}

pub fn run_optimize_pipeline(
    ports: Ports<'_>,
    data: &DataArgs,
    symbol: &str,
    kind: StrategyKind,
    overrides: OptimizeOverrides,
    output: Option<&Path>,
) -> Result<RankingTable, StratlabError> {
    let options = overrides.apply(optimize_options(ports.config)?);
    let series = load_series(ports.data, symbol, data.start, data.end)?;
    let table = optimize_series(ports.config, kind, &series, &options)?;
    if let Some(path) = output {
        ports.report.write_ranking(kind, &table.axis_names, &table.rows, path)?;
    }
    Ok(table)
}

fn run_optimize(
    data: &DataArgs,
    symbol: &str,
    kind: StrategyKind,
    config_path: Option<&Path>,
    overrides: OptimizeOverrides,
    top: usize,
    output: Option<&Path>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(data.data.clone());
    let ports = Ports {
        data: &data_port,
        report: &CsvReportAdapter,
        config: &config,
    };
    let table = run_optimize_pipeline(
        ports,
        data,
        symbol,
        kind,
        overrides,
        output,
    )?;

    println!("=== {symbol} / {kind} ===");
    println!("{:>5}  {}  terminal", "rank", table.axis_names.join("  "));
    for row in table.rows.iter().take(top) {
        let values: Vec<String> = row
            .values
            .iter()
            .zip(&table.axis_names)
            .map(|(v, name)| format!("{v:>width$}", width = name.len()))
            .collect();
        println!("{:>5}  {}  {:.4}", row.rank, values.join("  "), row.terminal);
    }
    println!(
        "{} combinations, {} evaluated{}, {} failed",
        table.combinations,
        table.rows.len() + table.failures,
        if table.sampled { " (sampled)" } else { "" },
        table.failures,
    );
    if let Some(path) = output {
        eprintln!("Ranking written to: {}", path.display());
    }

    if table.rows.is_empty() {
        return Err(StratlabError::Data {
            reason: "no parameter combination could be evaluated".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// signals
// ---------------------------------------------------------------------------

pub type SignalOutcome = Result<Option<Trend>, StratlabError>;

#[derive(Debug)]
pub struct SymbolSignals {
    pub symbol: String,
    pub signals: Result<Vec<(StrategyKind, SignalOutcome)>, StratlabError>,
}

/// One pass over `symbols`: latest signal of every configured strategy.
pub fn scan_signals(
    data_port: &dyn DataPort,
    configs: &[StrategyConfig],
    symbols: &[String],
    data: &DataArgs,
) -> Vec<SymbolSignals> {
    symbols
        .iter()
        .map(|symbol| {
            let signals = load_series(data_port, symbol, data.start, data.end).map(|series| {
                evaluate_all(configs, &series)
                    .into_iter()
                    .map(|(kind, outcome)| (kind, outcome.map(|e| e.signal)))
                    .collect()
            });
            if let Err(e) = &signals {
                tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
            }
            SymbolSignals {
                symbol: symbol.clone(),
                signals,
            }
        })
        .collect()
}

fn run_signals(
    data: &DataArgs,
    symbols: &[String],
    config_path: Option<&Path>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let configs = build_configs(&config, &[])?;
    let data_port = CsvAdapter::new(data.data.clone());
    let symbols = resolve_symbols(&data_port, symbols)?;

    let scanned = scan_signals(&data_port, &configs, &symbols, data);
    for entry in &scanned {
        match &entry.signals {
            Ok(signals) => {
                for (kind, outcome) in signals {
                    match outcome {
                        Ok(signal) => {
                            println!("{:<10} {:<20} {}", entry.symbol, kind.as_str(), signal_label(*signal))
                        }
                        Err(e) => println!("{:<10} {:<20} error: {e}", entry.symbol, kind.as_str()),
                    }
                }
            }
            Err(e) => println!("{:<10} error: {e}", entry.symbol),
        }
    }

    if scanned.iter().all(|s| s.signals.is_err()) {
        if let Some(SymbolSignals { signals: Err(e), .. }) = scanned.into_iter().next() {
            return Err(e);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// screen
// ---------------------------------------------------------------------------

pub fn run_screen_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    data: &DataArgs,
    symbols: &[String],
    threshold: Option<f64>,
) -> Result<Vec<ScreenEntry>, StratlabError> {
    let threshold = match threshold {
        Some(t) if !(0.0..=1.0).contains(&t) => {
            return Err(StratlabError::invalid_parameter(
                "threshold",
                "must be between 0 and 1",
            ));
        }
        Some(t) => t,
        None => screen_threshold(config)?,
    };
    let symbols = resolve_symbols(data_port, symbols)?;

    let mut loaded = Vec::with_capacity(symbols.len());
    let mut first_error = None;
    for symbol in symbols {
        match load_series(data_port, &symbol, data.start, data.end) {
            Ok(series) => loaded.push((symbol, series)),
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
                first_error.get_or_insert(e);
            }
        }
    }
    if loaded.is_empty() {
        return Err(first_error.unwrap_or(StratlabError::NoData {
            symbol: "*".to_string(),
        }));
    }
    Ok(correlation::screen(&loaded, threshold))
}

fn run_screen(
    data: &DataArgs,
    symbols: &[String],
    config_path: Option<&Path>,
    threshold: Option<f64>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(data.data.clone());
    let entries = run_screen_pipeline(&data_port, &config, data, symbols, threshold)?;
    for entry in &entries {
        let others: Vec<String> = entry
            .uncorrelated
            .iter()
            .map(|(s, r)| format!("{s} ({r:.2})"))
            .collect();
        println!("{:<10} {}", entry.symbol, others.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn run_validate(config_path: &Path) -> Result<(), StratlabError> {
    let config = load_config(Some(config_path))?;
    config_validation::validate_all(&config)?;
    for strategy in build_configs(&config, &[])? {
        println!("{}: {:?}", strategy.kind(), strategy);
    }
    println!("{:?}", optimize_options(&config)?);
    println!("Configuration is valid.");
    Ok(())
}
