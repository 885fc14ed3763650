//! Stratlab command-line interface.
//!
//! Lists the built-in strategies, validates parameter files and runs
//! backtests over bar series stored as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use backtester::{BacktestRequest, BacktestRunner, BarQuery, InMemoryBarSource, InMemoryRunRepository, RunStatus};
use clap::{Parser, Subcommand};
use market_core::types::{MarketBar, Timeframe};
use market_core::EngineConfig;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use strategies::{ParameterDefinition, Strategy, StrategyId, StrategyParameters, StrategyType};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Strategy backtesting engine
#[derive(Parser)]
#[command(name = "stratlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Engine configuration file (TOML, JSON or YAML); defaults to environment variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in strategies and their parameters
    Strategies,

    /// Check a parameter file against a strategy
    Validate {
        /// Strategy id or name
        #[arg(short, long)]
        strategy: String,

        /// JSON parameter file
        #[arg(short, long)]
        params: PathBuf,
    },

    /// Backtest a strategy over a JSON array of bars
    Run {
        /// Strategy id or name
        #[arg(short, long)]
        strategy: String,

        /// JSON bar file, sorted by timestamp
        #[arg(short, long)]
        bars: PathBuf,

        /// JSON parameter file; the strategy defaults apply when omitted
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Bar interval of the series
        #[arg(short, long, default_value = "1h")]
        timeframe: String,

        /// Symbol stamped on trades
        #[arg(long)]
        symbol: Option<String>,

        /// Starting balance
        #[arg(long)]
        balance: Option<Decimal>,

        /// Commission rate per fill, as a fraction
        #[arg(long)]
        commission: Option<Decimal>,

        /// Simulate at most this many bars from the start of the series
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Registry entry as printed by `stratlab strategies`.
#[derive(Serialize)]
struct StrategyInfo {
    id: StrategyId,
    name: String,
    strategy_type: StrategyType,
    description: String,
    default_parameters: StrategyParameters,
    parameters: Vec<ParameterDefinition>,
}

fn setup_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stratlab=info,backtester=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::from_env()?,
    };
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_strategies() -> Result<()> {
    let infos: Vec<StrategyInfo> = strategies::available()
        .into_iter()
        .map(|(id, strategy)| StrategyInfo {
            id,
            name: strategy.name().to_string(),
            strategy_type: strategy.strategy_type(),
            description: strategy.description().to_string(),
            default_parameters: strategy.default_parameters(),
            parameters: strategy.parameter_definitions(),
        })
        .collect();
    print_json(&infos)
}

/// Smallest gap between consecutive bars, if it is tighter than `timeframe`.
fn spacing_below(series: &[MarketBar], timeframe: Timeframe) -> Option<chrono::Duration> {
    series
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .min()
        .filter(|gap| *gap < timeframe.to_duration())
}

fn validate(strategy: &str, params: &Path) -> Result<()> {
    let strategy = strategies::resolve(strategy)?;
    let params: StrategyParameters = read_json(params)?;
    strategy.validate_parameters(&params)?;
    println!("Parameters are valid for {}", strategy.name());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run(
    config: EngineConfig,
    strategy: &str,
    bars: &Path,
    params: Option<&Path>,
    timeframe: &str,
    symbol: Option<String>,
    balance: Option<Decimal>,
    commission: Option<Decimal>,
    limit: Option<usize>,
) -> Result<()> {
    let id: StrategyId = strategy.parse()?;
    let timeframe: Timeframe = timeframe.parse()?;
    let parameters = match params {
        Some(path) => read_json(path)?,
        None => id.strategy().default_parameters(),
    };

    let series: Vec<MarketBar> = read_json(bars)?;
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        bail!("{} contains no bars", bars.display());
    };
    let symbol = symbol.unwrap_or_else(|| config.default_symbol.clone());
    if let Some(gap) = spacing_below(&series, timeframe) {
        warn!(%timeframe, gap_secs = gap.num_seconds(), "Bars are closer together than the timeframe");
    }
    let mut query = BarQuery::range(symbol.clone(), timeframe, first.timestamp, last.timestamp);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    info!(strategy = %id, symbol = %symbol, bars = series.len(), "Loaded bar series");

    let source = InMemoryBarSource::new();
    source.insert(&symbol, timeframe, series);
    let runner = BacktestRunner::new(Arc::new(source), Arc::new(InMemoryRunRepository::new()), config);

    let mut request = BacktestRequest::new(id, parameters, query);
    request.initial_balance = balance;
    request.commission_rate = commission;

    let run = runner.submit(request).await?;
    print_json(&run)?;

    if run.status == RunStatus::Failed {
        bail!(run.error.unwrap_or_else(|| "backtest failed".to_string()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.json_logs);

    match cli.command {
        Commands::Strategies => list_strategies(),
        Commands::Validate { strategy, params } => validate(&strategy, &params),
        Commands::Run {
            strategy,
            bars,
            params,
            timeframe,
            symbol,
            balance,
            commission,
            limit,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run(
                config,
                &strategy,
                &bars,
                params.as_deref(),
                &timeframe,
                symbol,
                balance,
                commission,
                limit,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::parse_from([
            "stratlab", "run", "--strategy", "rsi", "--bars", "bars.json", "--balance", "5000",
            "--limit", "500",
        ]);
        match cli.command {
            Commands::Run { strategy, balance, timeframe, limit, .. } => {
                assert_eq!(strategy, "rsi");
                assert_eq!(balance, Some(Decimal::from(5000)));
                assert_eq!(timeframe, "1h");
                assert_eq!(limit, Some(500));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_spacing_below_timeframe() {
        use chrono::{Duration, TimeZone, Utc};

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bar = |minutes: i64| {
            let price = Decimal::from(100);
            MarketBar::new(start + Duration::minutes(minutes), price, price, price, price, price)
        };
        let hourly = vec![bar(0), bar(60), bar(120)];
        let mixed = vec![bar(0), bar(60), bar(75)];

        assert_eq!(spacing_below(&hourly, Timeframe::Hour1), None);
        assert_eq!(spacing_below(&hourly, Timeframe::Minute15), None);
        assert_eq!(spacing_below(&mixed, Timeframe::Hour1), Some(Duration::minutes(15)));
        assert_eq!(spacing_below(&[], Timeframe::Hour1), None);
    }
}
