//! Stratlab: deterministic strategy backtesting
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the member crates. For actual functionality, use them directly:
//!
//! - `market-core`: Bars, positions, signals, trade records, errors, config
//! - `indicators`: SMA, EMA, RSI, MACD, Bollinger Bands, ATR, VWAP
//! - `strategies`: Strategy contract, parameter sets, built-in strategies
//! - `backtester`: Bar-by-bar simulator, performance metrics, run lifecycle
//! - `backtest-cli`: The `stratlab` command-line tool

// Re-export for benchmarks
pub use backtester as engine;
pub use indicators as ta;
pub use market_core as core;
pub use strategies as strategy;
