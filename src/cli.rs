//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult, WarmupMode};
use crate::domain::config_validation::{
    parse_date, parse_window_list, validate_backtest_config, validate_data_config,
    validate_sweep_config, validate_symbol,
};
use crate::domain::error::SmacrossError;
use crate::domain::sweep::{run_sweep, SweepGrid, SweepResults};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_TOP: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "Moving-average crossover backtester")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        short: Option<usize>,
        #[arg(long)]
        long: Option<usize>,
        #[arg(long)]
        initial: Option<f64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Sweep (short, long) window pairs and rank them by terminal value
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the available date range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestOverrides {
    pub short_window: Option<usize>,
    pub long_window: Option<usize>,
    pub initial_investment: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BacktestOverrides {
    pub fn apply(&self, config: BacktestConfig) -> BacktestConfig {
        BacktestConfig {
            short_window: self.short_window.unwrap_or(config.short_window),
            long_window: self.long_window.unwrap_or(config.long_window),
            initial_investment: self.initial_investment.unwrap_or(config.initial_investment),
            start_date: self.start_date.or(config.start_date),
            end_date: self.end_date.or(config.end_date),
            warmup: config.warmup,
        }
    }
}

pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            symbol,
            short,
            long,
            initial,
            start,
            end,
            output,
            dry_run,
        } => {
            let overrides = BacktestOverrides {
                short_window: short,
                long_window: long,
                initial_investment: initial,
                start_date: start,
                end_date: end,
            };
            if dry_run {
                run_dry_run(&config, symbol.as_deref(), &overrides)
            } else {
                run_backtest_command(&config, symbol.as_deref(), &overrides, output.as_deref())
            }
        }
        Command::Sweep {
            config,
            symbol,
            top,
            output,
        } => run_sweep_command(&config, symbol.as_deref(), top, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SmacrossError> {
    tracing::info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| SmacrossError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    let defaults = BacktestConfig::default();

    let start_date = adapter
        .get_string("backtest", "start_date")
        .map(|s| parse_date(&s, "backtest", "start_date"))
        .transpose()?;
    let end_date = adapter
        .get_string("backtest", "end_date")
        .map(|s| parse_date(&s, "backtest", "end_date"))
        .transpose()?;

    let warmup = match adapter.get_string("backtest", "warmup") {
        Some(raw) => raw
            .parse::<WarmupMode>()
            .map_err(|reason| SmacrossError::ConfigInvalid {
                section: "backtest".into(),
                key: "warmup".into(),
                reason,
            })?,
        None => defaults.warmup,
    };

    Ok(BacktestConfig {
        short_window: window_value(adapter, "short_window", defaults.short_window)?,
        long_window: window_value(adapter, "long_window", defaults.long_window)?,
        initial_investment: adapter.get_double(
            "backtest",
            "initial_investment",
            defaults.initial_investment,
        ),
        start_date,
        end_date,
        warmup,
    })
}

fn window_value(
    adapter: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, SmacrossError> {
    let value = adapter.get_int("backtest", key, default as i64);
    usize::try_from(value).map_err(|_| SmacrossError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: format!("{} must be an integer >= 1", key),
    })
}

pub fn build_sweep_grid(adapter: &dyn ConfigPort) -> Result<SweepGrid, SmacrossError> {
    let list = |key: &str| -> Result<Vec<usize>, SmacrossError> {
        let items = adapter
            .get_list("sweep", key)
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "sweep".into(),
                key: key.into(),
            })?;
        parse_window_list(&items, key)
    };

    Ok(SweepGrid::new(list("short_windows")?, list("long_windows")?)
        .with_unordered(adapter.get_bool("sweep", "allow_unordered", false)))
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, SmacrossError> {
    let path = adapter
        .get_string("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| SmacrossError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let source = adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => Ok(Box::new(CsvAdapter::new(path))),
        "json" => Ok(Box::new(JsonAdapter::new(path))),
        other => Err(SmacrossError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}', expected csv or json", other),
        }),
    }
}

/// `.json` outputs get the JSON report, everything else CSV.
pub fn report_port_for(path: &Path) -> Box<dyn ReportPort> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonReportAdapter)
    } else {
        Box::new(CsvReportAdapter)
    }
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, SmacrossError> {
    symbol_override
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| config.get_string("data", "symbol"))
        .ok_or_else(|| SmacrossError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

pub fn resolve_output(output: Option<&Path>, config: &dyn ConfigPort) -> Option<PathBuf> {
    output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from))
}

fn fetch_history(
    data_port: &dyn DataPort,
    symbol: &str,
    end_date: Option<NaiveDate>,
) -> Result<crate::domain::price_series::PriceSeries, SmacrossError> {
    // start is left open so the SMAs can warm up on earlier history
    let prices = data_port.fetch_prices(symbol, None, end_date)?;
    if prices.is_empty() {
        return Err(SmacrossError::NoData {
            symbol: symbol.to_string(),
        });
    }
    tracing::info!(
        "Loaded {} prices for {} ({} to {})",
        prices.len(),
        symbol,
        fmt_date(prices.first_date()),
        fmt_date(prices.last_date())
    );
    Ok(prices)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    config: &BacktestConfig,
    output: Option<&Path>,
) -> Result<BacktestResult, SmacrossError> {
    let prices = fetch_history(data_port, symbol, config.end_date)?;

    tracing::info!(
        "Running backtest: SMA({}) vs SMA({}), warmup {}",
        config.short_window,
        config.long_window,
        config.warmup
    );
    let result = run_backtest(&prices, config)?;

    print_backtest_summary(symbol, &result);

    if let Some(path) = output {
        report_port_for(path).write_backtest(&result, path)?;
        tracing::info!("Report written to: {}", path.display());
    }

    Ok(result)
}

pub fn run_sweep_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    grid: &SweepGrid,
    base: &BacktestConfig,
    top: usize,
    output: Option<&Path>,
) -> Result<SweepResults, SmacrossError> {
    let prices = fetch_history(data_port, symbol, base.end_date)?;
    let results = run_sweep(&prices, grid, base)?;

    println!("=== Sweep Results: {} ({} pairs) ===", symbol, results.len());
    println!(
        "{:>6} {:>6} {:>16} {:>10} {:>7}",
        "short", "long", "terminal", "return", "trades"
    );
    for entry in results.top(top) {
        println!(
            "{:>6} {:>6} {:>16.2} {:>9.2}% {:>7}",
            entry.short_window,
            entry.long_window,
            entry.terminal_value,
            entry.total_return * 100.0,
            entry.trades
        );
    }

    if let Some(path) = output {
        report_port_for(path).write_sweep(&results, path)?;
        tracing::info!("Sweep written to: {}", path.display());
    }

    Ok(results)
}

fn print_backtest_summary(symbol: &str, result: &BacktestResult) {
    println!("=== Backtest: {} ===", symbol);
    println!(
        "Range:            {} to {} ({} periods)",
        fmt_date(result.prices.first_date()),
        fmt_date(result.prices.last_date()),
        result.prices.len()
    );
    println!(
        "Windows:          SMA({}) / SMA({})",
        result.config.short_window, result.config.long_window
    );
    println!("Buy signals:      {}", result.signals.buy_indices().len());
    println!("Sell signals:     {}", result.signals.sell_indices().len());
    println!("Exposed periods:  {}", result.positions.exposed_periods());
    println!("Initial:          {:.2}", result.config.initial_investment);
    println!("Terminal Value:   {:.2}", result.terminal_value);
    println!("Total Return:     {:.2}%", result.total_return() * 100.0);
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn load_backtest_settings(
    config_path: &Path,
    overrides: &BacktestOverrides,
) -> Result<(FileConfigAdapter, BacktestConfig), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    validate_backtest_config(&adapter)?;
    let config = overrides.apply(build_backtest_config(&adapter)?);
    Ok((adapter, config))
}

fn run_backtest_command(
    config_path: &Path,
    symbol: Option<&str>,
    overrides: &BacktestOverrides,
    output: Option<&Path>,
) -> Result<(), SmacrossError> {
    let (adapter, config) = load_backtest_settings(config_path, overrides)?;
    let symbol = resolve_symbol(symbol, &adapter)?;
    let data_port = build_data_port(&adapter)?;
    let output = resolve_output(output, &adapter);

    run_backtest_pipeline(data_port.as_ref(), &symbol, &config, output.as_deref())?;
    Ok(())
}

pub fn run_dry_run(
    config_path: &Path,
    symbol: Option<&str>,
    overrides: &BacktestOverrides,
) -> Result<(), SmacrossError> {
    let (adapter, config) = load_backtest_settings(config_path, overrides)?;
    let symbol = resolve_symbol(symbol, &adapter)?;

    println!("symbol:             {}", symbol);
    println!(
        "source:             {}",
        adapter
            .get_string("data", "source")
            .unwrap_or_else(|| "csv".to_string())
    );
    println!(
        "path:               {}",
        adapter.get_string("data", "path").unwrap_or_default()
    );
    println!("short_window:       {}", config.short_window);
    println!("long_window:        {}", config.long_window);
    println!("initial_investment: {}", config.initial_investment);
    println!("start_date:         {}", fmt_date(config.start_date));
    println!("end_date:           {}", fmt_date(config.end_date));
    println!("warmup:             {}", config.warmup);
    if config.short_window >= config.long_window {
        tracing::warn!(
            "short window {} is not below long window {}",
            config.short_window,
            config.long_window
        );
    }
    tracing::info!("Dry run complete: configuration is valid");
    Ok(())
}

fn run_sweep_command(
    config_path: &Path,
    symbol: Option<&str>,
    top: Option<usize>,
    output: Option<&Path>,
) -> Result<(), SmacrossError> {
    let (adapter, base) = load_backtest_settings(config_path, &BacktestOverrides::default())?;
    validate_sweep_config(&adapter)?;
    let grid = build_sweep_grid(&adapter)?;
    let symbol = resolve_symbol(symbol, &adapter)?;
    let data_port = build_data_port(&adapter)?;
    let output = resolve_output(output, &adapter);
    let top = top
        .or_else(|| {
            adapter
                .get_string("sweep", "top")
                .and_then(|t| t.parse().ok())
        })
        .unwrap_or(DEFAULT_TOP);

    run_sweep_pipeline(
        data_port.as_ref(),
        &symbol,
        &grid,
        &base,
        top,
        output.as_deref(),
    )?;
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    validate_symbol(&adapter)?;
    validate_backtest_config(&adapter)?;
    let config = build_backtest_config(&adapter)?;
    println!(
        "[backtest] SMA({}) / SMA({}), initial {}, warmup {}",
        config.short_window, config.long_window, config.initial_investment, config.warmup
    );

    if adapter.get_string("sweep", "short_windows").is_some()
        || adapter.get_string("sweep", "long_windows").is_some()
    {
        validate_sweep_config(&adapter)?;
        let grid = build_sweep_grid(&adapter)?;
        grid.validate()?;
        println!("[sweep] {} window pairs", grid.pairs().len());
    }

    tracing::info!("Configuration is valid.");
    Ok(())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    let data_port = build_data_port(&adapter)?;

    let symbols = match symbol {
        Some(s) => vec![s.to_string()],
        None => match adapter.get_string("data", "symbol") {
            Some(s) => vec![s],
            None => data_port.list_symbols()?,
        },
    };

    for s in &symbols {
        match data_port.get_data_range(s)? {
            Some((first, last, count)) => {
                println!("{}: {} prices, {} to {}", s, count, first, last);
            }
            None => tracing::warn!("{}: no data found", s),
        }
    }
    Ok(())
}
