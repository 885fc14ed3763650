//! Lookup of built-in strategies by identifier.

use std::fmt;
use std::str::FromStr;

use market_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::families::{
    BollingerBandsStrategy, MacdStrategy, MovingAverageCrossover, RsiStrategy, VwapStrategy,
};
use crate::strategy::Strategy;

/// Identifier of a built-in strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    MaCrossover,
    Rsi,
    BollingerBands,
    Macd,
    Vwap,
}

impl StrategyId {
    pub const ALL: [StrategyId; 5] = [
        StrategyId::MaCrossover,
        StrategyId::Rsi,
        StrategyId::BollingerBands,
        StrategyId::Macd,
        StrategyId::Vwap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::MaCrossover => "ma_crossover",
            StrategyId::Rsi => "rsi",
            StrategyId::BollingerBands => "bollinger_bands",
            StrategyId::Macd => "macd",
            StrategyId::Vwap => "vwap",
        }
    }

    /// A fresh instance of the strategy.
    pub fn strategy(&self) -> Box<dyn Strategy> {
        let build: Constructor = match self {
            StrategyId::MaCrossover => boxed::<MovingAverageCrossover>,
            StrategyId::Rsi => boxed::<RsiStrategy>,
            StrategyId::BollingerBands => boxed::<BollingerBandsStrategy>,
            StrategyId::Macd => boxed::<MacdStrategy>,
            StrategyId::Vwap => boxed::<VwapStrategy>,
        };
        build()
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = Error;

    /// Accepts the identifier or the display name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        REGISTRY
            .iter()
            .map(|(id, build)| (*id, build()))
            .find(|(id, strategy)| {
                id.as_str().eq_ignore_ascii_case(wanted)
                    || strategy.name().eq_ignore_ascii_case(wanted)
            })
            .map(|(id, _)| id)
            .ok_or_else(|| Error::UnsupportedConfiguration(format!("Unknown strategy '{}'", s)))
    }
}

type Constructor = fn() -> Box<dyn Strategy>;

fn boxed<S: Strategy + Default + 'static>() -> Box<dyn Strategy> {
    Box::new(S::default())
}

static REGISTRY: [(StrategyId, Constructor); 5] = [
    (StrategyId::MaCrossover, boxed::<MovingAverageCrossover>),
    (StrategyId::Rsi, boxed::<RsiStrategy>),
    (StrategyId::BollingerBands, boxed::<BollingerBandsStrategy>),
    (StrategyId::Macd, boxed::<MacdStrategy>),
    (StrategyId::Vwap, boxed::<VwapStrategy>),
];

/// Resolve an identifier or display name to a strategy.
pub fn resolve(id: &str) -> Result<Box<dyn Strategy>> {
    Ok(id.parse::<StrategyId>()?.strategy())
}

/// Every built-in strategy, in registry order.
pub fn available() -> Vec<(StrategyId, Box<dyn Strategy>)> {
    REGISTRY.iter().map(|(id, build)| (*id, build())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_id_and_name() {
        assert_eq!(resolve("rsi").unwrap().name(), "RSI");
        assert_eq!(resolve("Moving Average Crossover").unwrap().name(), "Moving Average Crossover");
        assert_eq!("BOLLINGER_BANDS".parse::<StrategyId>().unwrap(), StrategyId::BollingerBands);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        match resolve("turtle") {
            Err(Error::UnsupportedConfiguration(msg)) => assert!(msg.contains("turtle")),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("unknown strategy resolved"),
        }
    }

    #[test]
    fn test_registry_matches_ids() {
        let strategies = available();
        assert_eq!(strategies.len(), StrategyId::ALL.len());
        for (id, strategy) in strategies {
            assert_eq!(id.strategy().name(), strategy.name());
            assert_eq!(strategy.default_parameters().family.kind(), id.as_str());
            assert!(strategy.validate_parameters(&strategy.default_parameters()).is_ok());
        }
    }

    #[test]
    fn test_id_round_trips_through_display() {
        for id in StrategyId::ALL {
            assert_eq!(id.to_string().parse::<StrategyId>().unwrap(), id);
        }
    }
}
