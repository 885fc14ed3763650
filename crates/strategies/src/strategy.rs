//! The strategy contract shared by every trading algorithm.

use indicators::{atr, volume_confirmed};
use market_core::types::{MarketBar, Position, Signal};
use market_core::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::parameters::{FamilyParameters, RiskParameters, StrategyParameters};

/// Number of bars preceding the current one used for volume confirmation.
pub const VOLUME_LOOKBACK: usize = 20;

/// Broad trading style of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    TrendFollowing,
    MeanReversion,
    Breakout,
}

/// Where a strategy implementation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategySource {
    /// Built into the engine.
    HardCoded,
    /// User-supplied, evaluated outside the engine and adapted to this trait.
    Custom,
}

/// Value type of a configurable parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum ParameterKind {
    Integer,
    Decimal,
    Boolean,
    Choice(Vec<String>),
}

/// Description of one configurable parameter, for configuration front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub kind: ParameterKind,
    pub default: String,
    pub description: String,
}

impl ParameterDefinition {
    pub fn new(
        name: &str,
        kind: ParameterKind,
        default: impl ToString,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: default.to_string(),
            description: description.to_string(),
        }
    }
}

/// A trading algorithm evaluated once per bar.
///
/// Implementations are stateless: everything they need arrives through
/// `analyze`, so one instance can serve many concurrent runs.
pub trait Strategy: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    fn strategy_type(&self) -> StrategyType;

    fn source(&self) -> StrategySource {
        StrategySource::HardCoded
    }

    fn description(&self) -> &str;

    /// Parameters a front-end can expose, including the shared risk settings.
    fn parameter_definitions(&self) -> Vec<ParameterDefinition>;

    /// A valid parameter set to start from.
    fn default_parameters(&self) -> StrategyParameters;

    /// Check `params` before a run starts. The error names the first
    /// offending field.
    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()>;

    /// Decide what to do on the last bar of `bars`.
    ///
    /// `bars` holds every bar up to and including the current one. Returns a
    /// `Hold` with reason "Insufficient data" when the window is shorter than
    /// the strategy needs. Never returns `Buy` while `position` is `Some`,
    /// nor `Sell` while it is `None`.
    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal>;
}

/// Error for parameters that belong to another strategy family.
pub(crate) fn family_mismatch(strategy: &str, params: &StrategyParameters) -> Error {
    Error::UnsupportedConfiguration(format!(
        "{} cannot run with '{}' parameters",
        strategy,
        params.family.kind()
    ))
}

/// Family check followed by full validation.
pub(crate) fn validate_for_family(
    strategy: &str,
    expected: &str,
    params: &StrategyParameters,
) -> Result<()> {
    if params.family.kind() != expected {
        return Err(family_mismatch(strategy, params));
    }
    params.validate()
}

/// Whether the window is too short for `family`.
pub(crate) fn lacks_data(bars: &[MarketBar], family: &FamilyParameters) -> bool {
    bars.is_empty() || bars.len() < family.min_bars()
}

/// Stop-loss and take-profit prices for an entry at `entry_price`.
///
/// The stop is `entry * (1 - stop_loss_percent / 100)`, or
/// `entry - ATR * atr_multiplier` when ATR stops are enabled and ATR is
/// defined for the window. Zero percentages disable the corresponding level.
pub fn exit_levels(
    bars: &[MarketBar],
    entry_price: Decimal,
    risk: &RiskParameters,
) -> (Option<Decimal>, Option<Decimal>) {
    let percent_stop = (risk.stop_loss_percent > Decimal::ZERO).then(|| {
        entry_price * (Decimal::ONE - risk.stop_loss_percent / Decimal::ONE_HUNDRED)
    });

    let stop_loss = if risk.use_atr_for_stops {
        atr(bars, risk.atr_period)
            .map(|value| entry_price - value * risk.atr_multiplier)
            .or(percent_stop)
    } else {
        percent_stop
    };

    let take_profit = (risk.take_profit_percent > Decimal::ZERO).then(|| {
        entry_price * (Decimal::ONE + risk.take_profit_percent / Decimal::ONE_HUNDRED)
    });

    (stop_loss, take_profit)
}

/// Turn a triggered entry into a signal, applying volume confirmation and
/// attaching exit levels. Only called when no position is open.
pub(crate) fn enter(bars: &[MarketBar], risk: &RiskParameters, reason: String) -> Signal {
    let Some(current) = bars.last() else {
        return Signal::insufficient_data();
    };

    if !volume_ok(bars, risk) {
        return Signal::hold(format!("{} without volume confirmation", reason));
    }

    let (stop_loss, take_profit) = exit_levels(bars, current.close, risk);
    Signal::buy(current.close, reason).with_exits(stop_loss, take_profit)
}

/// Turn a triggered exit into a signal, applying volume confirmation. Only
/// called when a position is open.
pub(crate) fn exit(bars: &[MarketBar], risk: &RiskParameters, reason: String) -> Signal {
    let Some(current) = bars.last() else {
        return Signal::insufficient_data();
    };

    if !volume_ok(bars, risk) {
        return Signal::hold(format!("{} without volume confirmation", reason));
    }

    Signal::sell(current.close, reason)
}

fn volume_ok(bars: &[MarketBar], risk: &RiskParameters) -> bool {
    !risk.require_volume_confirmation
        || volume_confirmed(bars, VOLUME_LOOKBACK, risk.volume_multiplier)
}

/// Definitions of the risk settings every strategy shares.
pub fn risk_parameter_definitions() -> Vec<ParameterDefinition> {
    let defaults = RiskParameters::default();
    vec![
        ParameterDefinition::new(
            "stop_loss_percent",
            ParameterKind::Decimal,
            defaults.stop_loss_percent,
            "Stop distance below entry in percent (0 disables)",
        ),
        ParameterDefinition::new(
            "take_profit_percent",
            ParameterKind::Decimal,
            defaults.take_profit_percent,
            "Take-profit distance above entry in percent (0 disables)",
        ),
        ParameterDefinition::new(
            "position_size_percent",
            ParameterKind::Decimal,
            defaults.position_size_percent,
            "Validated only; fills currently commit the full balance",
        ),
        ParameterDefinition::new(
            "require_volume_confirmation",
            ParameterKind::Boolean,
            defaults.require_volume_confirmation,
            "Only act when volume is above its recent average",
        ),
        ParameterDefinition::new(
            "volume_multiplier",
            ParameterKind::Decimal,
            defaults.volume_multiplier,
            "Required multiple of average volume",
        ),
        ParameterDefinition::new(
            "use_atr_for_stops",
            ParameterKind::Boolean,
            defaults.use_atr_for_stops,
            "Place the stop ATR multiples below entry",
        ),
        ParameterDefinition::new(
            "atr_multiplier",
            ParameterKind::Decimal,
            defaults.atr_multiplier,
            "ATR multiples between entry and stop",
        ),
        ParameterDefinition::new(
            "atr_period",
            ParameterKind::Integer,
            defaults.atr_period,
            "ATR lookback in bars",
        ),
    ]
}
