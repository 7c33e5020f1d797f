//! CLI definition and dispatch.

use chrono::{Days, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::Backtester;
use crate::domain::bar::{AssetMode, PriceSeries};
use crate::domain::error::TradebenchError;
use crate::domain::metrics::Summary;
use crate::domain::run_config::RunConfig;
use crate::domain::signal::Signal;
use crate::domain::strategy::params::{generate_param_grid, grid_from_params};
use crate::domain::strategy::registry::{StrategyEntry, StrategyRegistry};
use crate::domain::strategy::StrategyParams;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportPort, RunLabel};

#[derive(Parser, Debug)]
#[command(name = "tradebench", about = "Strategy backtester over daily price tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Which strategies and instruments a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Registry id or alias; overrides `[backtest] strategy`
    #[arg(short, long, conflicts_with = "all")]
    pub strategy: Option<String>,
    /// Run every registered strategy
    #[arg(long)]
    pub all: bool,
    /// Ticker to load; repeat for a multi-asset table
    #[arg(long = "ticker")]
    pub tickers: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest, all strategies, or a parameter sweep
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Expand `|` separated parameter values (or the default grid)
        #[arg(long)]
        sweep: bool,
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Print the latest signal of each selected strategy
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
        /// Days of history to replay
        #[arg(long, default_value_t = 365)]
        lookback: u32,
        /// Last day to replay; defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List registered strategies
    Strategies,
    /// Check a configuration without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the data directory
    Tickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            selection,
            start,
            end,
            sweep,
            results_dir,
        } => run_backtest(&config, &selection, start, end, sweep, results_dir),
        Command::Signal {
            config,
            selection,
            lookback,
            end,
        } => run_signal(&config, &selection, lookback, end),
        Command::Strategies => {
            print_strategies(&StrategyRegistry::builtin());
            Ok(())
        }
        Command::Validate { config } => run_validate(&config),
        Command::Tickers { config } => run_tickers(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradebenchError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Reads the file and applies command-line overrides.
pub fn load_run_config(path: &Path, selection: &Selection) -> Result<RunConfig, TradebenchError> {
    let adapter = load_config(path)?;
    let mut config = RunConfig::from_config(&adapter)?;
    if !selection.tickers.is_empty() {
        config.tickers = selection.tickers.clone();
    }
    if let Some(strategy) = &selection.strategy {
        config.strategy = Some(strategy.clone());
    }
    Ok(config)
}

/// Every entry for `--all`, otherwise the one configured strategy.
pub fn selected_entries<'r>(
    registry: &'r StrategyRegistry,
    all: bool,
    config: &RunConfig,
) -> Result<Vec<&'r StrategyEntry>, TradebenchError> {
    if all {
        return Ok(registry.entries().iter().collect());
    }
    Ok(vec![registry.get(config.require_strategy()?)?])
}

/// One ticker loads its full columns; several are aligned on common dates
/// as one close column per ticker. `mode = None` detects from the columns.
pub fn load_series(
    data: &dyn DataPort,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    mode: Option<AssetMode>,
) -> Result<(PriceSeries, AssetMode), TradebenchError> {
    let series = match tickers {
        [ticker] if mode != Some(AssetMode::Multi) => {
            PriceSeries::new(data.fetch_bars(ticker, start, end)?)?
        }
        _ if mode == Some(AssetMode::Single) => {
            return Err(TradebenchError::ConfigInvalid {
                section: "backtest".into(),
                key: "mode".into(),
                reason: "single mode takes exactly one ticker".into(),
            });
        }
        _ => {
            let mut per_ticker = Vec::with_capacity(tickers.len());
            for ticker in tickers {
                per_ticker.push((ticker.clone(), data.fetch_bars(ticker, start, end)?));
            }
            PriceSeries::align_closes(&per_ticker)?
        }
    };
    if series.is_empty() {
        return Err(TradebenchError::Data {
            reason: format!("no dates shared by {}", tickers.join(", ")),
        });
    }
    let mode = mode.unwrap_or_else(|| AssetMode::detect(&series));
    info!(tickers = %tickers.join(","), bars = series.len(), ?mode, "loaded price series");
    Ok((series, mode))
}

/// Parameter sets to run for `entry`. Configured values win over the
/// entry's default grid, which only applies to sweeps. Without a sweep only
/// the first candidate of each value is used.
pub fn param_sets(
    entry: &StrategyEntry,
    configured: &StrategyParams,
    sweep: bool,
) -> Vec<StrategyParams> {
    let axes = if !configured.is_empty() {
        grid_from_params(configured)
    } else if sweep {
        entry.default_axes()
    } else {
        Vec::new()
    };

    let grid = generate_param_grid(&axes);
    if sweep {
        return grid;
    }
    if grid.len() > 1 {
        warn!(
            strategy = entry.id,
            combinations = grid.len(),
            "parameters list several candidates; using the first (pass --sweep to run all)"
        );
    }
    grid.into_iter().take(1).collect()
}

/// Dual momentum rotates across the loaded tickers unless told otherwise.
pub fn complete_params(
    entry: &StrategyEntry,
    params: StrategyParams,
    tickers: &[String],
) -> StrategyParams {
    let mut params = params;
    if entry.id == "dual_mom" && !params.contains("universe") {
        params.insert("universe", tickers.join(","));
    }
    params
}

/// One line of the run summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub strategy: String,
    pub param_hash: String,
    pub summary: Summary,
}

/// Inputs of a backtest batch after config and overrides are merged.
#[derive(Debug, Clone)]
pub struct BacktestRequest<'a> {
    pub entries: Vec<&'a StrategyEntry>,
    pub params: &'a StrategyParams,
    pub tickers: &'a [String],
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mode: Option<AssetMode>,
    pub sweep: bool,
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    /// Strategies that fail to build or run are skipped instead of aborting.
    pub skip_failures: bool,
}

pub fn run_backtests(
    data: &dyn DataPort,
    report: &dyn ReportPort,
    request: &BacktestRequest<'_>,
) -> Result<Vec<SummaryLine>, TradebenchError> {
    let (series, mode) = load_series(
        data,
        request.tickers,
        request.start,
        request.end,
        request.mode,
    )?;

    let mut lines = Vec::new();
    for entry in &request.entries {
        for params in param_sets(entry, request.params, request.sweep) {
            let params = complete_params(entry, params, request.tickers);
            let attempt = entry.create(&params).and_then(|strategy| {
                Backtester::new(strategy, series.clone(), mode).run()
            });
            let result = match attempt {
                Ok(result) => result,
                Err(e) if request.skip_failures => {
                    warn!(strategy = entry.id, error = %e, "skipping strategy");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let label = RunLabel {
                strategy: entry.id,
                params: &params,
                tickers: request.tickers,
            };
            let path = report.write(&result, &label)?;
            info!(strategy = entry.id, path = %path.display(), "results written");

            lines.push(SummaryLine {
                strategy: entry.id.to_string(),
                param_hash: params.hash(),
                summary: Summary::compute(
                    &result,
                    request.start,
                    request.end,
                    request.risk_free_rate,
                    request.periods_per_year,
                ),
            });
        }
    }
    Ok(lines)
}

fn run_backtest(
    config_path: &Path,
    selection: &Selection,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    sweep: bool,
    results_dir: Option<PathBuf>,
) -> Result<(), TradebenchError> {
    let mut config = load_run_config(config_path, selection)?;
    if start.is_some() {
        config.start_date = start;
    }
    if end.is_some() {
        config.end_date = end;
    }
    if let Some(dir) = results_dir {
        config.results_dir = dir;
    }
    let (start, end) = config.window()?;
    let tickers = config.require_tickers()?;

    let registry = StrategyRegistry::builtin();
    let request = BacktestRequest {
        entries: selected_entries(&registry, selection.all, &config)?,
        params: &config.params,
        tickers,
        start,
        end,
        mode: config.mode,
        sweep,
        risk_free_rate: config.risk_free_rate,
        periods_per_year: config.periods_per_year,
        skip_failures: selection.all,
    };

    let data = CsvAdapter::new(config.data_dir.clone());
    let report = CsvReportAdapter::new(config.results_dir.clone());
    let lines = run_backtests(&data, &report, &request)?;
    print!("{}", format_summary(&lines));
    Ok(())
}

pub fn format_summary(lines: &[SummaryLine]) -> String {
    let mut out = format!(
        "{:<20} {:<8} {:>9} {:>9} {:>7} {:>6}\n",
        "strategy", "params", "CAGR", "MaxDD", "Sharpe", "trades"
    );
    for line in lines {
        out.push_str(&format!(
            "{:<20} {:<8} {:>8.2}% {:>8.2}% {:>7.2} {:>6}\n",
            line.strategy,
            line.param_hash,
            line.summary.cagr * 100.0,
            line.summary.max_drawdown * 100.0,
            line.summary.sharpe_ratio,
            line.summary.trades,
        ));
    }
    out
}

/// Replays the series through each strategy and reports its last signal.
/// Weight mappings and strategies that cannot be built or fail on the data
/// report `N/A`.
pub fn latest_signals(
    series: &PriceSeries,
    entries: &[&StrategyEntry],
    params: &StrategyParams,
    tickers: &[String],
) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|entry| {
            let label = param_sets(entry, params, false)
                .into_iter()
                .next()
                .map(|p| complete_params(entry, p, tickers))
                .and_then(|p| match last_signal(entry, &p, series) {
                    Ok(Signal::Rebalance(_)) => None,
                    Ok(signal) => Some(signal.to_string()),
                    Err(e) => {
                        warn!(strategy = entry.id, error = %e, "no signal");
                        None
                    }
                })
                .unwrap_or_else(|| "N/A".to_string());
            (entry.id.to_string(), label)
        })
        .collect()
}

fn last_signal(
    entry: &StrategyEntry,
    params: &StrategyParams,
    series: &PriceSeries,
) -> Result<Signal, TradebenchError> {
    let mut strategy = entry.create(params)?;
    strategy.reset();
    let mut signal = Signal::Hold;
    for bar in series.bars() {
        signal = strategy.next_bar(bar)?;
    }
    Ok(signal)
}

fn run_signal(
    config_path: &Path,
    selection: &Selection,
    lookback: u32,
    end: Option<NaiveDate>,
) -> Result<(), TradebenchError> {
    let config = load_run_config(config_path, selection)?;
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = end
        .checked_sub_days(Days::new(u64::from(lookback)))
        .ok_or_else(|| {
            TradebenchError::invalid_parameter("lookback", "reaches before the calendar")
        })?;
    let tickers = config.require_tickers()?;

    let registry = StrategyRegistry::builtin();
    let entries = selected_entries(&registry, selection.all, &config)?;
    let data = CsvAdapter::new(config.data_dir.clone());
    let (series, _) = load_series(&data, tickers, start, end, config.mode)?;

    for (name, signal) in latest_signals(&series, &entries, &config.params, tickers) {
        println!("{name}: {signal}");
    }
    Ok(())
}

pub fn print_strategies(registry: &StrategyRegistry) {
    for entry in registry.entries() {
        println!("{:<20} {}", entry.id, entry.description);
        if !entry.aliases.is_empty() {
            println!("{:<20} aliases: {}", "", entry.aliases.join(", "));
        }
        if !entry.default_grid.is_empty() {
            let grid: Vec<String> = entry
                .default_grid
                .iter()
                .map(|(key, values)| format!("{key}={}", values.join("|")))
                .collect();
            println!("{:<20} default sweep: {}", "", grid.join(" "));
        }
    }
}

/// Checks dates, tickers, and that every configured parameter combination
/// builds the strategy.
pub fn validate_run_config(
    config: &RunConfig,
    registry: &StrategyRegistry,
) -> Result<(), TradebenchError> {
    config.window()?;
    let tickers = config.require_tickers()?;
    if let Some(name) = &config.strategy {
        let entry = registry.get(name)?;
        for params in param_sets(entry, &config.params, true) {
            entry.create(&complete_params(entry, params, tickers))?;
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradebenchError> {
    let config = load_run_config(config_path, &Selection::default())?;
    validate_run_config(&config, &StrategyRegistry::builtin())?;
    println!("Configuration is valid");
    Ok(())
}

fn run_tickers(config_path: &Path) -> Result<(), TradebenchError> {
    let config = load_run_config(config_path, &Selection::default())?;
    let data = CsvAdapter::new(config.data_dir.clone());
    let tickers = data.list_tickers()?;
    if tickers.is_empty() {
        warn!("no tickers found in {}", config.data_dir.display());
    }
    for ticker in &tickers {
        println!("{ticker}");
    }
    Ok(())
}
