//! VWAP deviation mean reversion.

use indicators::vwap;
use market_core::types::{MarketBar, Position, Signal};
use market_core::Result;
use rust_decimal::Decimal;
use tracing::trace;

use crate::parameters::{FamilyParameters, StrategyParameters};
use crate::strategy::{
    enter, exit, family_mismatch, lacks_data, risk_parameter_definitions, validate_for_family,
    ParameterDefinition, ParameterKind, Strategy, StrategyType,
};

const NAME: &str = "VWAP";

/// Buys when the close trades `deviation_threshold` percent or more below
/// the rolling VWAP, and sells an open position once it trades that far above.
#[derive(Debug, Clone, Copy, Default)]
pub struct VwapStrategy;

impl Strategy for VwapStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::MeanReversion
    }

    fn description(&self) -> &str {
        "Mean reversion around the volume-weighted average price"
    }

    fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        let mut definitions = vec![
            ParameterDefinition::new("period", ParameterKind::Integer, 20, "VWAP window in bars"),
            ParameterDefinition::new(
                "deviation_threshold",
                ParameterKind::Decimal,
                2,
                "Distance from VWAP, in percent, that triggers a trade",
            ),
        ];
        definitions.extend(risk_parameter_definitions());
        definitions
    }

    fn default_parameters(&self) -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::Vwap {
            period: 20,
            deviation_threshold: Decimal::TWO,
        })
    }

    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()> {
        validate_for_family(NAME, "vwap", params)
    }

    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal> {
        let FamilyParameters::Vwap {
            period,
            deviation_threshold,
        } = &params.family
        else {
            return Err(family_mismatch(NAME, params));
        };

        if lacks_data(bars, &params.family) {
            return Ok(Signal::insufficient_data());
        }

        let Some(vwap) = vwap(bars, *period).filter(|v| !v.is_zero()) else {
            return Ok(Signal::hold("VWAP undefined for window without volume"));
        };

        let close = bars[bars.len() - 1].close;
        let deviation = (close - vwap) / vwap * Decimal::ONE_HUNDRED;
        trace!(%vwap, %close, %deviation, "VWAP");

        let signal = match position {
            None if deviation <= -*deviation_threshold => enter(
                bars,
                &params.risk,
                format!("Close {}% below VWAP {}", deviation.abs().round_dp(2), vwap.round_dp(4)),
            ),
            Some(_) if deviation >= *deviation_threshold => exit(
                bars,
                &params.risk,
                format!("Close {}% above VWAP {}", deviation.round_dp(2), vwap.round_dp(4)),
            ),
            _ => Signal::hold(format!("Close within {}% of VWAP", deviation_threshold)),
        };

        Ok(signal)
    }
}
