//! Bollinger Band mean reversion.

use indicators::{bollinger_bands, closes};
use market_core::types::{MarketBar, Position, Signal};
use market_core::Result;
use rust_decimal::Decimal;
use tracing::trace;

use crate::parameters::{FamilyParameters, StrategyParameters};
use crate::strategy::{
    enter, exit, family_mismatch, lacks_data, risk_parameter_definitions, validate_for_family,
    ParameterDefinition, ParameterKind, Strategy, StrategyType,
};

const NAME: &str = "Bollinger Bands";

/// Buys when the close touches or pierces the lower band, optionally only
/// when the close has turned up from the previous bar, and sells an open
/// position when the close reaches the upper band.
#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerBandsStrategy;

impl Strategy for BollingerBandsStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::MeanReversion
    }

    fn description(&self) -> &str {
        "Mean reversion between the lower and upper Bollinger Band"
    }

    fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        let mut definitions = vec![
            ParameterDefinition::new("period", ParameterKind::Integer, 20, "Moving average period"),
            ParameterDefinition::new(
                "std_dev_multiplier",
                ParameterKind::Decimal,
                2,
                "Band width in standard deviations",
            ),
            ParameterDefinition::new(
                "require_momentum_confirmation",
                ParameterKind::Boolean,
                false,
                "Only buy a lower-band touch when the close rises from the previous bar",
            ),
        ];
        definitions.extend(risk_parameter_definitions());
        definitions
    }

    fn default_parameters(&self) -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::BollingerBands {
            period: 20,
            std_dev_multiplier: Decimal::TWO,
            require_momentum_confirmation: false,
        })
    }

    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()> {
        validate_for_family(NAME, "bollinger_bands", params)
    }

    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal> {
        let FamilyParameters::BollingerBands {
            period,
            std_dev_multiplier,
            require_momentum_confirmation,
        } = &params.family
        else {
            return Err(family_mismatch(NAME, params));
        };

        if lacks_data(bars, &params.family) {
            return Ok(Signal::insufficient_data());
        }

        let closes = closes(bars);
        let Some(bands) = bollinger_bands(&closes, *period, *std_dev_multiplier) else {
            return Ok(Signal::insufficient_data());
        };

        let close = closes[closes.len() - 1];
        let prev_close = closes[closes.len() - 2];
        trace!(upper = %bands.upper, middle = %bands.middle, lower = %bands.lower, %close, "Bollinger Bands");

        // Zero deviation collapses both bands onto the close.
        if bands.width().is_zero() {
            return Ok(Signal::hold("Bands collapsed on a flat window"));
        }

        let signal = match position {
            None if close <= bands.lower => {
                if *require_momentum_confirmation && close <= prev_close {
                    Signal::hold("Lower band touched without upward momentum")
                } else {
                    enter(
                        bars,
                        &params.risk,
                        format!("Close {} at or below lower band {}", close, bands.lower.round_dp(4)),
                    )
                }
            }
            Some(_) if close >= bands.upper => exit(
                bars,
                &params.risk,
                format!("Close {} at or above upper band {}", close, bands.upper.round_dp(4)),
            ),
            _ => Signal::hold("Price inside bands"),
        };

        Ok(signal)
    }
}
