//! Strategy parameter sets and their validation.

use indicators::MovingAverageType;
use market_core::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for any indicator period.
pub const MAX_PERIOD: usize = 1000;

/// Full parameter set for one strategy run: the family-specific indicator
/// settings plus the shared risk settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub family: FamilyParameters,
    #[serde(default)]
    pub risk: RiskParameters,
}

impl StrategyParameters {
    pub fn new(family: FamilyParameters, risk: RiskParameters) -> Self {
        Self { family, risk }
    }

    /// Family settings with default risk settings.
    pub fn with_defaults(family: FamilyParameters) -> Self {
        Self::new(family, RiskParameters::default())
    }

    /// Check every numeric constraint, reporting the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.family.validate()?;
        self.risk.validate()
    }
}

/// Risk and execution settings shared by every strategy family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Stop distance below entry, in percent. Zero disables the stop.
    pub stop_loss_percent: Decimal,
    /// Take-profit distance above entry, in percent. Zero disables it.
    pub take_profit_percent: Decimal,
    /// Share of the balance to commit per entry, in percent.
    pub position_size_percent: Decimal,
    /// Require above-average volume before acting on a signal.
    pub require_volume_confirmation: bool,
    /// Current volume must be at least this multiple of recent average volume.
    pub volume_multiplier: Decimal,
    /// Derive the stop from ATR instead of `stop_loss_percent`.
    pub use_atr_for_stops: bool,
    /// Stop distance in ATR multiples when `use_atr_for_stops` is set.
    pub atr_multiplier: Decimal,
    /// ATR lookback.
    pub atr_period: usize,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            stop_loss_percent: Decimal::new(5, 0),
            take_profit_percent: Decimal::new(10, 0),
            position_size_percent: Decimal::ONE_HUNDRED,
            require_volume_confirmation: false,
            volume_multiplier: Decimal::new(15, 1), // 1.5x
            use_atr_for_stops: false,
            atr_multiplier: Decimal::TWO,
            atr_period: 14,
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<()> {
        if self.stop_loss_percent < Decimal::ZERO || self.stop_loss_percent >= Decimal::ONE_HUNDRED {
            return Err(Error::invalid_parameter(
                "stop_loss_percent",
                "must be in [0, 100)",
            ));
        }
        if self.take_profit_percent < Decimal::ZERO {
            return Err(Error::invalid_parameter(
                "take_profit_percent",
                "must not be negative",
            ));
        }
        if self.position_size_percent <= Decimal::ZERO
            || self.position_size_percent > Decimal::ONE_HUNDRED
        {
            return Err(Error::invalid_parameter(
                "position_size_percent",
                "must be in (0, 100]",
            ));
        }
        if self.volume_multiplier < Decimal::ZERO
            || (self.require_volume_confirmation && self.volume_multiplier.is_zero())
        {
            return Err(Error::invalid_parameter(
                "volume_multiplier",
                "must be positive when volume confirmation is enabled",
            ));
        }
        if self.atr_multiplier < Decimal::ZERO
            || (self.use_atr_for_stops && self.atr_multiplier.is_zero())
        {
            return Err(Error::invalid_parameter(
                "atr_multiplier",
                "must be positive when ATR stops are enabled",
            ));
        }
        check_period("atr_period", self.atr_period)
    }
}

/// Indicator settings per strategy family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FamilyParameters {
    /// Fast/slow moving average crossover.
    MaCrossover {
        fast_period: usize,
        slow_period: usize,
        #[serde(default)]
        ma_type: MovingAverageType,
    },
    /// RSI oversold/overbought.
    Rsi {
        period: usize,
        oversold: Decimal,
        overbought: Decimal,
    },
    /// Close touching the Bollinger Bands.
    BollingerBands {
        period: usize,
        std_dev_multiplier: Decimal,
        /// Only buy a lower-band touch when the close ticks up from the previous bar.
        #[serde(default)]
        require_momentum_confirmation: bool,
    },
    /// MACD line crossing its signal line.
    Macd {
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    },
    /// Close deviating from VWAP.
    Vwap {
        period: usize,
        /// Deviation from VWAP, in percent, that triggers a trade.
        deviation_threshold: Decimal,
    },
}

impl FamilyParameters {
    /// Stable identifier of the family, matching the serde tag.
    pub fn kind(&self) -> &'static str {
        match self {
            FamilyParameters::MaCrossover { .. } => "ma_crossover",
            FamilyParameters::Rsi { .. } => "rsi",
            FamilyParameters::BollingerBands { .. } => "bollinger_bands",
            FamilyParameters::Macd { .. } => "macd",
            FamilyParameters::Vwap { .. } => "vwap",
        }
    }

    /// Minimum bar window needed to evaluate the family's entry and exit
    /// rules on the current bar, including the previous-bar values that
    /// crossover and momentum checks compare against. ATR is not included;
    /// ATR stops fall back to percentage stops while ATR is undefined.
    pub fn min_bars(&self) -> usize {
        match self {
            FamilyParameters::MaCrossover { slow_period, .. } => *slow_period + 1,
            FamilyParameters::Rsi { period, .. } => *period + 1,
            FamilyParameters::BollingerBands { period, .. } => *period + 1,
            FamilyParameters::Macd {
                slow_period,
                signal_period,
                ..
            } => *slow_period + *signal_period,
            FamilyParameters::Vwap { period, .. } => *period,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FamilyParameters::MaCrossover {
                fast_period,
                slow_period,
                ..
            } => {
                check_period("fast_period", *fast_period)?;
                check_period("slow_period", *slow_period)?;
                if fast_period >= slow_period {
                    return Err(Error::invalid_parameter(
                        "fast_period",
                        "must be less than slow_period",
                    ));
                }
                Ok(())
            }
            FamilyParameters::Rsi {
                period,
                oversold,
                overbought,
            } => {
                check_period("period", *period)?;
                if *oversold <= Decimal::ZERO || *oversold >= Decimal::ONE_HUNDRED {
                    return Err(Error::invalid_parameter("oversold", "must be in (0, 100)"));
                }
                if *overbought <= Decimal::ZERO || *overbought >= Decimal::ONE_HUNDRED {
                    return Err(Error::invalid_parameter("overbought", "must be in (0, 100)"));
                }
                if oversold >= overbought {
                    return Err(Error::invalid_parameter(
                        "oversold",
                        "must be less than overbought",
                    ));
                }
                Ok(())
            }
            FamilyParameters::BollingerBands {
                period,
                std_dev_multiplier,
                ..
            } => {
                check_period("period", *period)?;
                if *period < 2 {
                    return Err(Error::invalid_parameter("period", "must be at least 2"));
                }
                if *std_dev_multiplier < Decimal::new(1, 1) || *std_dev_multiplier > Decimal::new(5, 0) {
                    return Err(Error::invalid_parameter(
                        "std_dev_multiplier",
                        "must be between 0.1 and 5",
                    ));
                }
                Ok(())
            }
            FamilyParameters::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => {
                check_period("fast_period", *fast_period)?;
                check_period("slow_period", *slow_period)?;
                check_period("signal_period", *signal_period)?;
                if fast_period >= slow_period {
                    return Err(Error::invalid_parameter(
                        "fast_period",
                        "must be less than slow_period",
                    ));
                }
                Ok(())
            }
            FamilyParameters::Vwap {
                period,
                deviation_threshold,
            } => {
                check_period("period", *period)?;
                if *deviation_threshold <= Decimal::ZERO || *deviation_threshold > Decimal::new(50, 0) {
                    return Err(Error::invalid_parameter(
                        "deviation_threshold",
                        "must be in (0, 50] percent",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn check_period(field: &str, period: usize) -> Result<()> {
    if period == 0 || period > MAX_PERIOD {
        return Err(Error::invalid_parameter(
            field,
            format!("must be between 1 and {}", MAX_PERIOD),
        ));
    }
    Ok(())
}
