//! Moving average crossover.

use indicators::{closes, MovingAverageType};
use market_core::types::{MarketBar, Position, Signal};
use market_core::Result;
use tracing::trace;

use crate::parameters::{FamilyParameters, StrategyParameters};
use crate::strategy::{
    enter, exit, family_mismatch, lacks_data, risk_parameter_definitions, validate_for_family,
    ParameterDefinition, ParameterKind, Strategy, StrategyType,
};

const NAME: &str = "Moving Average Crossover";

/// Buys when the fast average crosses above the slow one (golden cross) and
/// sells on the opposite cross (death cross).
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverageCrossover;

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        NAME
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::TrendFollowing
    }

    fn description(&self) -> &str {
        "Trend following on fast/slow moving average crossovers"
    }

    fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        let mut definitions = vec![
            ParameterDefinition::new("fast_period", ParameterKind::Integer, 9, "Fast moving average period"),
            ParameterDefinition::new("slow_period", ParameterKind::Integer, 21, "Slow moving average period"),
            ParameterDefinition::new(
                "ma_type",
                ParameterKind::Choice(vec!["simple".to_string(), "exponential".to_string()]),
                "simple",
                "Moving average type",
            ),
        ];
        definitions.extend(risk_parameter_definitions());
        definitions
    }

    fn default_parameters(&self) -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::MaCrossover {
            fast_period: 9,
            slow_period: 21,
            ma_type: MovingAverageType::Simple,
        })
    }

    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()> {
        validate_for_family(NAME, "ma_crossover", params)
    }

    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal> {
        let FamilyParameters::MaCrossover {
            fast_period,
            slow_period,
            ma_type,
        } = &params.family
        else {
            return Err(family_mismatch(NAME, params));
        };

        if lacks_data(bars, &params.family) {
            return Ok(Signal::insufficient_data());
        }

        let closes = closes(bars);
        let previous = &closes[..closes.len() - 1];

        let (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
            ma_type.compute(&closes, *fast_period),
            ma_type.compute(&closes, *slow_period),
            ma_type.compute(previous, *fast_period),
            ma_type.compute(previous, *slow_period),
        ) else {
            return Ok(Signal::insufficient_data());
        };

        trace!(%fast, %slow, %prev_fast, %prev_slow, "Moving averages");

        let signal = match position {
            None if prev_fast <= prev_slow && fast > slow => enter(
                bars,
                &params.risk,
                format!("Golden cross: fast MA {} above slow MA {}", fast, slow),
            ),
            Some(_) if prev_fast >= prev_slow && fast < slow => exit(
                bars,
                &params.risk,
                format!("Death cross: fast MA {} below slow MA {}", fast, slow),
            ),
            _ => Signal::hold("No crossover"),
        };

        Ok(signal)
    }
}
