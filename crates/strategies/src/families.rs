//! Built-in strategy families.

pub mod bollinger;
pub mod ma_crossover;
pub mod macd;
pub mod rsi;
pub mod vwap;

pub use bollinger::BollingerBandsStrategy;
pub use ma_crossover::MovingAverageCrossover;
pub use macd::MacdStrategy;
pub use rsi::RsiStrategy;
pub use vwap::VwapStrategy;
