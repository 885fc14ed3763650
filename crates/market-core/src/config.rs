//! Configuration management for the backtest engine.

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Engine-wide defaults applied to every backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting cash balance for a run.
    pub initial_balance: Decimal,
    /// Commission charged per fill, as a fraction of the traded value.
    pub commission_rate: Decimal,
    /// Maximum number of runs the runner executes at the same time.
    pub max_concurrent_runs: usize,
    /// Symbol stamped on trade records when the request does not name one.
    pub default_symbol: String,
    /// Exchange stamped on trade records when the request does not name one.
    pub default_exchange: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::new(10000, 0),
            commission_rate: Decimal::new(1, 3), // 0.1%
            max_concurrent_runs: 4,
            default_symbol: "BTCUSDT".to_string(),
            default_exchange: "binance".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            initial_balance: parsed_var::<Decimal>("BACKTEST_INITIAL_BALANCE")?
                .unwrap_or(defaults.initial_balance),
            commission_rate: parsed_var::<Decimal>("BACKTEST_COMMISSION_RATE")?
                .unwrap_or(defaults.commission_rate),
            max_concurrent_runs: parsed_var("BACKTEST_MAX_CONCURRENT_RUNS")?
                .unwrap_or(defaults.max_concurrent_runs),
            default_symbol: env::var("BACKTEST_SYMBOL").unwrap_or(defaults.default_symbol),
            default_exchange: env::var("BACKTEST_EXCHANGE").unwrap_or(defaults.default_exchange),
        };

        config.validate()?;
        debug!(?config, "Loaded engine config from environment");
        Ok(config)
    }

    /// Load configuration from a file (format inferred from the extension),
    /// with `BACKTEST_*` environment variables taking precedence.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("BACKTEST"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), ?config, "Loaded engine config");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.initial_balance <= Decimal::ZERO {
            return Err(Error::Config {
                message: "initial_balance must be positive".to_string(),
            });
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(Error::Config {
                message: "commission_rate must be in [0, 1)".to_string(),
            });
        }
        if self.max_concurrent_runs == 0 {
            return Err(Error::Config {
                message: "max_concurrent_runs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse an optional environment variable; a set but malformed value is an error.
fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| Error::Config {
            message: format!("{} is invalid: {}", name, e),
        }),
        Err(_) => Ok(None),
    }
}
