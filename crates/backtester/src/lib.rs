//! Backtester
//!
//! Bar-by-bar simulation of a trading strategy over historical data.
//!
//! # Features
//!
//! - **Backtest Simulator**: single-position state machine with stop-loss
//!   precedence, all-in sizing and commission on every fill
//! - **Performance Aggregation**: return, drawdown and win/loss statistics
//! - **Run Lifecycle**: Pending -> Running -> Completed | Failed records handed
//!   to a pluggable repository
//! - **Runner**: bounded concurrent execution with one execution per run id
//!
//! # Example
//!
//! ```ignore
//! use backtester::{BacktestSimulator, SimulatorConfig};
//! use strategies::{MovingAverageCrossover, Strategy};
//!
//! let simulator = BacktestSimulator::new(SimulatorConfig::default());
//! let strategy = MovingAverageCrossover;
//! let result = simulator.run(&strategy, &bars, &strategy.default_parameters())?;
//! println!("Return: {:.2}%", result.total_return_percent);
//! ```

pub mod data_store;
pub mod metrics;
pub mod run;
pub mod simulator;

// Re-exports
pub use data_store::{BarQuery, BarSource, InMemoryBarSource};
pub use metrics::{
    aggregate, max_drawdown_percent, win_loss, BacktestResult, DrawdownTracker, EquityPoint,
    RunSummary,
};
pub use run::{
    BacktestRequest, BacktestRun, BacktestRunner, InMemoryRunRepository, RunRepository, RunStatus,
};
pub use simulator::{BacktestJob, BacktestSimulator, SimulatorConfig};
