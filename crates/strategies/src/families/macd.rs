//! MACD signal-line crossover.

use indicators::{closes, macd_series};
use market_core::types::{MarketBar, Position, Signal};
use market_core::Result;
use tracing::trace;

use crate::parameters::{FamilyParameters, StrategyParameters};
use crate::strategy::{
    enter, exit, family_mismatch, lacks_data, risk_parameter_definitions, validate_for_family,
    ParameterDefinition, ParameterKind, Strategy, StrategyType,
};

const NAME: &str = "MACD";

/// Buys when the MACD line crosses above its signal line and sells an open
/// position when it crosses back below.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdStrategy;

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::TrendFollowing
    }

    fn description(&self) -> &str {
        "Trend following on MACD and signal line crossovers"
    }

    fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        let mut definitions = vec![
            ParameterDefinition::new("fast_period", ParameterKind::Integer, 12, "Fast EMA period"),
            ParameterDefinition::new("slow_period", ParameterKind::Integer, 26, "Slow EMA period"),
            ParameterDefinition::new("signal_period", ParameterKind::Integer, 9, "Signal line EMA period"),
        ];
        definitions.extend(risk_parameter_definitions());
        definitions
    }

    fn default_parameters(&self) -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::Macd {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        })
    }

    fn validate_parameters(&self, params: &StrategyParameters) -> Result<()> {
        validate_for_family(NAME, "macd", params)
    }

    fn analyze(
        &self,
        bars: &[MarketBar],
        position: Option<&Position>,
        params: &StrategyParameters,
    ) -> Result<Signal> {
        let FamilyParameters::Macd {
            fast_period,
            slow_period,
            signal_period,
        } = &params.family
        else {
            return Err(family_mismatch(NAME, params));
        };

        if lacks_data(bars, &params.family) {
            return Ok(Signal::insufficient_data());
        }

        let series = macd_series(&closes(bars), *fast_period, *slow_period, *signal_period);
        let [.., previous, current] = series.as_slice() else {
            return Ok(Signal::insufficient_data());
        };
        trace!(macd = %current.macd, signal = %current.signal, histogram = %current.histogram, "MACD");

        let signal = match position {
            None if previous.macd <= previous.signal && current.macd > current.signal => enter(
                bars,
                &params.risk,
                format!(
                    "MACD {} crossed above signal {}",
                    current.macd.round_dp(4),
                    current.signal.round_dp(4)
                ),
            ),
            Some(_) if previous.macd >= previous.signal && current.macd < current.signal => exit(
                bars,
                &params.risk,
                format!(
                    "MACD {} crossed below signal {}",
                    current.macd.round_dp(4),
                    current.signal.round_dp(4)
                ),
            ),
            _ => Signal::hold("No MACD crossover"),
        };

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::test_support::{bars_from_closes, closes as to_closes};
    use rust_decimal::Decimal;

    // Periods whose EMA weights are exact in decimal, so a straight-line
    // trend yields a flat MACD that never crosses its signal line.
    fn params() -> StrategyParameters {
        StrategyParameters::with_defaults(FamilyParameters::Macd {
            fast_period: 3,
            slow_period: 7,
            signal_period: 3,
        })
    }

    #[test]
    fn test_insufficient_data() {
        let strategy = MacdStrategy;
        let bars = bars_from_closes(&to_closes((0..8).map(|i| 100 - i)));
        let signal = strategy.analyze(&bars, None, &params()).unwrap();
        assert_eq!(signal.reason, "Insufficient data");
    }

    #[test]
    fn test_bullish_cross_buys() {
        let strategy = MacdStrategy;
        let params = params();
        let falling = (0..15).map(|i| 200 - 2 * i);
        let rising = (1..=15).map(|i| 172 + 3 * i);
        let bars = bars_from_closes(&to_closes(falling.chain(rising)));

        let first_buy = (0..bars.len())
            .find(|&i| strategy.analyze(&bars[..=i], None, &params).unwrap().is_buy())
            .expect("reversal should produce a buy");
        assert!(first_buy >= 15);

        let series = macd_series(&indicators::closes(&bars[..=first_buy]), 3, 7, 3);
        let current = series[series.len() - 1];
        let previous = series[series.len() - 2];
        assert!(previous.macd <= previous.signal);
        assert!(current.macd > current.signal);
    }

    #[test]
    fn test_bearish_cross_sells_only_with_position() {
        let strategy = MacdStrategy;
        let params = params();
        let rising = (0..15).map(|i| 100 + 2 * i);
        let falling = (1..=15).map(|i| 128 - 3 * i);
        let bars = bars_from_closes(&to_closes(rising.chain(falling)));
        let position = Position::open(Decimal::ONE, bars[0].close, bars[0].timestamp);

        let sells = (0..bars.len())
            .filter(|&i| strategy.analyze(&bars[..=i], Some(&position), &params).unwrap().is_sell())
            .count();
        assert!(sells >= 1);

        for i in 0..bars.len() {
            let signal = strategy.analyze(&bars[..=i], None, &params).unwrap();
            assert!(!signal.is_sell());
            let signal = strategy.analyze(&bars[..=i], Some(&position), &params).unwrap();
            assert!(!signal.is_buy());
        }
    }

    #[test]
    fn test_default_parameters_valid() {
        let strategy = MacdStrategy;
        assert!(strategy.validate_parameters(&strategy.default_parameters()).is_ok());
        assert_eq!(strategy.default_parameters().family.min_bars(), 35);
    }
}
