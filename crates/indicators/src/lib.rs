//! Technical Indicators
//!
//! Pure functions over a window of bars or closes. Every indicator returns
//! `None` (or an empty series) when the window is shorter than its period,
//! which strategies treat as insufficient data.
//!
//! All arithmetic is done in [`rust_decimal::Decimal`] so that threshold
//! comparisons are reproducible bit for bit across runs.

pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod volume;
pub mod vwap;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger_bands, BollingerBands};
pub use macd::{macd, macd_series, MacdValue};
pub use moving_average::{ema, ema_series, sma, MovingAverageType};
pub use rsi::rsi;
pub use volume::{average_volume, volume_confirmed};
pub use vwap::vwap;

use market_core::types::MarketBar;
use rust_decimal::Decimal;

/// Closing prices of a bar window.
pub fn closes(bars: &[MarketBar]) -> Vec<Decimal> {
    bars.iter().map(|b| b.close).collect()
}
