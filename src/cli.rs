//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::backtest::{run_backtest, BacktestRequest, PortfolioMixEntry};
use crate::domain::config_validation::{load_settings, AppSettings, DataSource, LOG_LEVELS};
use crate::domain::error::PortmixError;
use crate::domain::rebalance::RebalancePolicy;
use crate::domain::request_validation::validate_request;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "portmix", about = "Backtest a weighted mix of portfolios against a benchmark")]
pub struct Cli {
    /// Log level, overriding `[logging] level` and RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the result as JSON
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        request: RequestArgs,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a request file without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        request: PathBuf,
    },
    /// Load a CSV data directory into the configured SQLite database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        csv_dir: PathBuf,
    },
}

/// A request given either as a JSON file or inline.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// JSON request file
    #[arg(short, long, conflicts_with_all = ["portfolio", "benchmark", "start", "end", "rebalance"])]
    pub request: Option<PathBuf>,
    /// Mix entry as <portfolio_id>=<weight percent>; repeat for each portfolio
    #[arg(short, long, value_name = "ID=PCT")]
    pub portfolio: Vec<String>,
    #[arg(short, long)]
    pub benchmark: Option<i64>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
    #[arg(long)]
    pub rebalance: Option<RebalancePolicy>,
}

pub fn run(cli: Cli) -> ExitCode {
    let log_level = cli.log_level.as_deref();
    let outcome = match cli.command {
        Command::Backtest {
            config,
            request,
            output,
        } => run_backtest_command(&config, &request, output.as_deref(), log_level),
        Command::Validate { config, request } => run_validate(&config, &request, log_level),
        Command::Import { config, csv_dir } => run_import(&config, &csv_dir, log_level),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PortmixError> {
    FileConfigAdapter::from_file(path)
}

/// Installs the stderr subscriber. An explicit level wins over RUST_LOG,
/// which wins over the configured level.
pub fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn prepare(config_path: &Path, log_level: Option<&str>) -> Result<(FileConfigAdapter, AppSettings), PortmixError> {
    if let Some(level) = log_level {
        if !LOG_LEVELS.contains(&level) {
            return Err(PortmixError::ConfigInvalid {
                section: "logging".to_string(),
                key: "level".to_string(),
                reason: format!("unknown log level '{}'", level),
            });
        }
    }
    let config = load_config(config_path)?;
    let settings = load_settings(&config)?;
    init_logging(log_level, &settings.log_level);
    tracing::debug!(config = %config_path.display(), "configuration loaded");
    Ok((config, settings))
}

pub fn open_data_port(settings: &AppSettings) -> Result<Box<dyn DataPort>, PortmixError> {
    match &settings.data_source {
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite { path, pool_size } => {
            let adapter = SqliteAdapter::open(&path.to_string_lossy(), *pool_size)?;
            adapter.initialize_schema()?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "sqlite"))]
        DataSource::Sqlite { .. } => Err(PortmixError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: "built without the sqlite feature".to_string(),
        }),
        DataSource::Csv { dir } => Ok(Box::new(CsvAdapter::open(dir)?)),
    }
}

/// Parses one `<portfolio_id>=<weight>` mix entry.
pub fn parse_mix_entry(arg: &str) -> Result<PortfolioMixEntry, PortmixError> {
    let parse_err = || PortmixError::RequestParse {
        reason: format!("invalid portfolio entry '{}', expected <id>=<weight>", arg),
    };
    let (id, weight) = arg.split_once('=').ok_or_else(parse_err)?;
    Ok(PortfolioMixEntry {
        portfolio_id: id.trim().parse().map_err(|_| parse_err())?,
        weight: weight.trim().trim_end_matches('%').parse().map_err(|_| parse_err())?,
    })
}

pub fn read_request_file(path: &Path) -> Result<BacktestRequest, PortmixError> {
    let content = fs::read_to_string(path)?;
    BacktestRequest::from_json(&content)
}

pub fn build_request(args: &RequestArgs) -> Result<BacktestRequest, PortmixError> {
    if let Some(path) = &args.request {
        return read_request_file(path);
    }

    let missing = |flag: &str| PortmixError::RequestParse {
        reason: format!("--{} is required without --request", flag),
    };

    Ok(BacktestRequest {
        portfolio_mix: args
            .portfolio
            .iter()
            .map(|p| parse_mix_entry(p))
            .collect::<Result<Vec<_>, _>>()?,
        benchmark_id: args.benchmark.ok_or_else(|| missing("benchmark"))?,
        start_date: args.start.ok_or_else(|| missing("start"))?,
        end_date: args.end.ok_or_else(|| missing("end"))?,
        rebalance_frequency: args.rebalance.unwrap_or_default(),
    })
}

fn run_backtest_command(
    config_path: &Path,
    request_args: &RequestArgs,
    output: Option<&Path>,
    log_level: Option<&str>,
) -> Result<(), PortmixError> {
    let (_config, settings) = prepare(config_path, log_level)?;
    let request = build_request(request_args)?;
    let data_port = open_data_port(&settings)?;

    validate_request(&request, data_port.as_ref())?;
    tracing::info!(
        portfolios = request.portfolio_mix.len(),
        benchmark_id = request.benchmark_id,
        start = %request.start_date,
        end = %request.end_date,
        policy = %request.rebalance_frequency,
        "running backtest"
    );

    let result = run_backtest(data_port.as_ref(), &request)?;
    if result.is_degraded() {
        tracing::warn!(
            reason = result.error.as_deref().unwrap_or_default(),
            "backtest returned without statistics"
        );
    }

    JsonReportAdapter::new(settings.pretty_output).write(&result, output)?;
    if let Some(path) = output {
        eprintln!("Result written to: {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path, request_path: &Path, log_level: Option<&str>) -> Result<(), PortmixError> {
    let (_config, settings) = prepare(config_path, log_level)?;
    let request = read_request_file(request_path)?;
    let data_port = open_data_port(&settings)?;

    validate_request(&request, data_port.as_ref())?;
    eprintln!(
        "Request is valid: {} portfolio(s), benchmark {}, {} to {}, rebalance {}",
        request.portfolio_mix.len(),
        request.benchmark_id,
        request.start_date,
        request.end_date,
        request.rebalance_frequency
    );
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, csv_dir: &Path, log_level: Option<&str>) -> Result<(), PortmixError> {
    let (config, _settings) = prepare(config_path, log_level)?;
    let source = CsvAdapter::open(csv_dir)?;
    let target = SqliteAdapter::from_config(&config)?;

    target.initialize_schema()?;
    target.import(source.data())?;

    let data = source.data();
    eprintln!(
        "Imported {} assets, {} portfolios, {} mappings, {} benchmarks, {} prices",
        data.assets.len(),
        data.portfolios.len(),
        data.mappings.len(),
        data.benchmarks.len(),
        data.prices.len()
    );
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _csv_dir: &Path, _log_level: Option<&str>) -> Result<(), PortmixError> {
    Err(PortmixError::ConfigInvalid {
        section: "data".to_string(),
        key: "source".to_string(),
        reason: "import requires the sqlite feature".to_string(),
    })
}
