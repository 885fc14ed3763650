//! RSI oversold/overbought mean reversion.

use indicators::{closes, rsi};
use market_core::types::{MarketBar, Position, Signal};
use market_core::Result;
use rust_decimal::Decimal;
use tracing::trace;

use crate::parameters::{FamilyParameters, StrategyParameters};
use crate::strategy::{
    enter, exit, family_mismatch, lacks_data, risk_parameter_definitions, validate_for_family,
    ParameterDefinition, ParameterKind, Strategy, StrategyType,
};

const NAME: &str = "RSI";

/// Buys when RSI drops below the oversold level and sells an open position
/// once RSI rises above the overbought level.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsiStrategy;

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::MeanReversion
    }

    fn description(&self) -> &str {
        "Mean reversion on RSI oversold and overbought levels"
    }

    fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        let mut definitions = vec![
            ParameterDefinition::new("period", ParameterKind::Integer, 14, "RSI period"),
            ParameterDefinition::new("oversold", ParameterKind::Decimal, 30, "Buy below this RSI"),
            ParameterDefinition::new("overbought", ParameterKind::Decimal, 70, "Sell above this RSI"),
        ];
        definitions.extend(risk_parameter_definitions());
        definitions
    }

    fn default_parameters(&self) -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::Rsi {
            period: 14,
            oversold: Decimal::new(30, 0),
            overbought: Decimal::new(70, 0),
        })
    }

    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()> {
        validate_for_family(NAME, "rsi", params)
    }

    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal> {
        let FamilyParameters::Rsi {
            period,
            oversold,
            overbought,
        } = &params.family
        else {
            return Err(family_mismatch(NAME, params));
        };

        if lacks_data(bars, &params.family) {
            return Ok(Signal::insufficient_data());
        }

        let Some(value) = rsi(&closes(bars), *period) else {
            return Ok(Signal::insufficient_data());
        };
        trace!(rsi = %value, "RSI");

        let signal = match position {
            None if value < *oversold => enter(
                bars,
                &params.risk,
                format!("RSI {} below oversold {}", value.round_dp(2), oversold),
            ),
            Some(_) if value > *overbought => exit(
                bars,
                &params.risk,
                format!("RSI {} above overbought {}", value.round_dp(2), overbought),
            ),
            _ => Signal::hold(format!("RSI {} within range", value.round_dp(2))),
        };

        Ok(signal)
    }
}
