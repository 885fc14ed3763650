//! Market Core Library
//!
//! Shared bar, position, signal and trade types for the Stratlab backtest
//! engine, plus the engine error taxonomy and configuration loading.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{Error, Result};
