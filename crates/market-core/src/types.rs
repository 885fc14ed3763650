//! Core domain types for the backtest engine.

pub mod bar;
pub mod position;
pub mod signal;
pub mod timeframe;
pub mod trade;

pub use bar::*;
pub use position::*;
pub use signal::*;
pub use timeframe::*;
pub use trade::*;
