//! Bar-by-bar backtest simulator.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use market_core::types::{
    is_time_ordered, MarketBar, Position, Signal, SignalAction, TradeRecord, TradeType,
    FINAL_CLOSE_REASON, STOP_LOSS_REASON,
};
use market_core::{EngineConfig, Error, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::{Strategy, StrategyParameters};
use tracing::{debug, info, trace, warn};

use crate::metrics::{aggregate, BacktestResult, DrawdownTracker, EquityPoint, RunSummary};

/// Configuration for the backtest simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Starting cash balance.
    pub initial_balance: Decimal,
    /// Commission per fill as a fraction of the traded value (0.001 = 0.1%).
    pub commission_rate: Decimal,
    /// Symbol stamped on trade records.
    pub symbol: String,
    /// Exchange stamped on trade records.
    pub exchange: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SimulatorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            initial_balance: config.initial_balance,
            commission_rate: config.commission_rate,
            symbol: config.default_symbol.clone(),
            exchange: config.default_exchange.clone(),
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_balance <= Decimal::ZERO {
            return Err(Error::invalid_parameter("initial_balance", "must be positive"));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(Error::invalid_parameter("commission_rate", "must be in [0, 1)"));
        }
        Ok(())
    }
}

/// One simulation in a batch.
#[derive(Clone, Copy)]
pub struct BacktestJob<'a> {
    pub strategy: &'a dyn Strategy,
    pub bars: &'a [MarketBar],
    pub params: &'a StrategyParameters,
}

/// The backtest simulator engine.
///
/// A run is single-threaded and reads no clock, so identical inputs always
/// produce an identical [`BacktestResult`].
#[derive(Debug, Clone, Default)]
pub struct BacktestSimulator {
    config: SimulatorConfig,
}

impl BacktestSimulator {
    /// Create a new backtest simulator.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run `strategy` over `bars`, which must be sorted by timestamp.
    ///
    /// Parameters are validated before the first bar; invalid parameters
    /// fail the call without simulating anything.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        bars: &[MarketBar],
        params: &StrategyParameters,
    ) -> Result<BacktestResult> {
        self.run_with_cancel(strategy, bars, params, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but checks `cancel` before every bar and
    /// fails with [`Error::Cancelled`] once it is set.
    pub fn run_with_cancel(
        &self,
        strategy: &dyn Strategy,
        bars: &[MarketBar],
        params: &StrategyParameters,
        cancel: &AtomicBool,
    ) -> Result<BacktestResult> {
        self.config.validate()?;
        strategy.validate_parameters(params)?;
        if !is_time_ordered(bars) {
            return Err(Error::Simulation("bars are not in timestamp order".to_string()));
        }

        info!(
            strategy = strategy.name(),
            symbol = %self.config.symbol,
            bars = bars.len(),
            initial_balance = %self.config.initial_balance,
            "Starting backtest"
        );

        let mut state = SimulationState::new(self.config.initial_balance);

        for (i, bar) in bars.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!(strategy = strategy.name(), bar = i, "Backtest cancelled");
                return Err(Error::Cancelled);
            }
            self.process_bar(strategy, &bars[..=i], params, &mut state)?;
        }

        if let Some(last) = bars.last().filter(|_| state.position.is_some()) {
            self.close_position(&mut state, last.close, last.timestamp, FINAL_CLOSE_REASON);
            state.record_equity(last.timestamp);
        }

        let summary = RunSummary {
            strategy_name: strategy.name().to_string(),
            symbol: self.config.symbol.clone(),
            initial_balance: self.config.initial_balance,
            final_balance: state.balance,
            max_drawdown_percent: state.drawdown.max_drawdown_percent(),
            bars_processed: bars.len(),
        };
        let result = aggregate(summary, state.trades, state.equity_curve);

        info!(
            strategy = strategy.name(),
            final_balance = %result.final_balance,
            return_pct = %result.total_return_percent.round_dp(4),
            max_drawdown_pct = %result.max_drawdown_percent.round_dp(4),
            trades = result.total_trades,
            "Backtest completed"
        );

        Ok(result)
    }

    /// Run independent simulations in parallel. Results come back in job order.
    pub fn simulate_batch(&self, jobs: &[BacktestJob<'_>]) -> Vec<Result<BacktestResult>> {
        jobs.par_iter()
            .map(|job| {
                let result = self.run(job.strategy, job.bars, job.params);
                if let Err(e) = &result {
                    warn!(strategy = job.strategy.name(), error = %e, "Strategy backtest failed");
                }
                result
            })
            .collect()
    }

    // Private methods

    /// Advance the state machine by one bar. `window` ends with the current bar.
    fn process_bar(
        &self,
        strategy: &dyn Strategy,
        window: &[MarketBar],
        params: &StrategyParameters,
        state: &mut SimulationState,
    ) -> Result<()> {
        let Some(bar) = window.last() else {
            return Ok(());
        };

        // Stop-loss pre-empts the strategy for this bar.
        let stop_hit = state
            .position
            .as_ref()
            .filter(|p| p.is_stopped_out(bar.low))
            .and_then(|p| p.stop_price);
        if let Some(stop_price) = stop_hit {
            self.close_position(state, stop_price, bar.timestamp, STOP_LOSS_REASON);
            state.record_equity(bar.timestamp);
            return Ok(());
        }

        if let Some(position) = state.position.as_mut() {
            position.mark_to_market(bar.close);
        }

        let signal = strategy
            .analyze(window, state.position.as_ref(), params)
            .map_err(|e| match e {
                Error::Strategy { .. } => e,
                other => Error::strategy(strategy.name(), other.to_string()),
            })?;
        trace!(timestamp = %bar.timestamp, action = ?signal.action, reason = %signal.reason, "Signal");

        match signal.action {
            SignalAction::Buy if state.position.is_none() => {
                self.open_position(state, &signal, bar, params);
            }
            SignalAction::Sell if state.position.is_some() => {
                let price = signal.entry_price.unwrap_or(bar.close);
                self.close_position(state, price, bar.timestamp, &signal.reason);
            }
            SignalAction::Buy | SignalAction::Sell => {
                debug!(
                    timestamp = %bar.timestamp,
                    action = ?signal.action,
                    "Signal does not match position state, ignoring"
                );
            }
            SignalAction::Hold => {}
        }

        state.record_equity(bar.timestamp);
        Ok(())
    }

    fn open_position(
        &self,
        state: &mut SimulationState,
        signal: &Signal,
        bar: &MarketBar,
        params: &StrategyParameters,
    ) {
        if state.balance <= Decimal::ZERO {
            debug!(timestamp = %bar.timestamp, "No balance left, skipping buy");
            return;
        }

        let buy_price = signal.entry_price.unwrap_or(bar.close);
        if buy_price <= Decimal::ZERO {
            debug!(timestamp = %bar.timestamp, price = %buy_price, "Non-positive buy price, skipping buy");
            return;
        }

        let unit_commission = buy_price * self.config.commission_rate;
        let unit_cost = buy_price + unit_commission;
        if unit_cost > state.balance {
            debug!(
                timestamp = %bar.timestamp,
                cost = %unit_cost,
                balance = %state.balance,
                "Insufficient balance for one unit"
            );
            return;
        }

        // All-in: the whole balance buys units at price plus commission.
        let quantity = state.balance / unit_cost;
        let value = quantity * buy_price;
        let commission = state.balance - value;

        let stop_price = if params.risk.use_atr_for_stops {
            signal.stop_loss
        } else if params.risk.stop_loss_percent > Decimal::ZERO {
            Some(buy_price * (Decimal::ONE - params.risk.stop_loss_percent / Decimal::ONE_HUNDRED))
        } else {
            None
        };

        debug!(
            timestamp = %bar.timestamp,
            price = %buy_price,
            quantity = %quantity,
            commission = %commission,
            stop = ?stop_price,
            "Buy filled"
        );

        state.balance = Decimal::ZERO;
        let mut position = Position::open(quantity, buy_price, bar.timestamp).with_stop_price(stop_price);
        position.mark_to_market(bar.close);
        state.position = Some(position);
        state.trades.push(self.trade_record(
            TradeType::Buy,
            buy_price,
            quantity,
            commission,
            bar.timestamp,
            &signal.reason,
        ));
    }

    fn close_position(
        &self,
        state: &mut SimulationState,
        price: Decimal,
        timestamp: DateTime<Utc>,
        reason: &str,
    ) {
        let Some(position) = state.position.take() else {
            return;
        };

        let sale_value = position.quantity * price;
        let commission = sale_value * self.config.commission_rate;
        state.balance += sale_value - commission;

        debug!(
            timestamp = %timestamp,
            price = %price,
            quantity = %position.quantity,
            commission = %commission,
            reason,
            "Sell filled"
        );

        state.trades.push(self.trade_record(
            TradeType::Sell,
            price,
            position.quantity,
            commission,
            timestamp,
            reason,
        ));
    }

    fn trade_record(
        &self,
        trade_type: TradeType,
        price: Decimal,
        quantity: Decimal,
        commission: Decimal,
        timestamp: DateTime<Utc>,
        reason: &str,
    ) -> TradeRecord {
        TradeRecord {
            symbol: self.config.symbol.clone(),
            exchange: self.config.exchange.clone(),
            trade_type,
            price,
            quantity,
            value: price * quantity,
            commission,
            execution_timestamp: timestamp,
            reason: reason.to_string(),
        }
    }
}

/// Mutable state owned by one run.
struct SimulationState {
    balance: Decimal,
    position: Option<Position>,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    drawdown: DrawdownTracker,
}

impl SimulationState {
    fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            drawdown: DrawdownTracker::new(initial_balance),
        }
    }

    fn equity(&self) -> Decimal {
        self.balance
            + self
                .position
                .as_ref()
                .map(|p| p.current_value)
                .unwrap_or(Decimal::ZERO)
    }

    fn record_equity(&mut self, timestamp: DateTime<Utc>) {
        let equity = self.equity();
        self.drawdown.update(equity);
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }
}
