//! Strategies
//!
//! Built-in trading strategies and the contract they share. A strategy is a
//! stateless function from a bar window, the open position and a parameter
//! set to a [`market_core::types::Signal`].

pub mod families;
pub mod parameters;
pub mod registry;
pub mod strategy;

pub use families::{
    BollingerBandsStrategy, MacdStrategy, MovingAverageCrossover, RsiStrategy, VwapStrategy,
};
pub use parameters::{FamilyParameters, RiskParameters, StrategyParameters, MAX_PERIOD};
pub use registry::{available, resolve, StrategyId};
pub use strategy::{
    exit_levels, risk_parameter_definitions, ParameterDefinition, ParameterKind, Strategy,
    StrategySource, StrategyType,
};
