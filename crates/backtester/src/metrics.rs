//! Performance aggregation over a finished run.

use chrono::{DateTime, Utc};
use market_core::types::{TradeRecord, TradeType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account equity after a bar was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Cash balance plus the marked-to-market position value.
    pub equity: Decimal,
}

/// Result of a backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Strategy name.
    pub strategy_name: String,
    pub symbol: String,
    pub initial_balance: Decimal,
    /// Cash after the final close.
    pub final_balance: Decimal,
    pub total_return_percent: Decimal,
    pub max_drawdown_percent: Decimal,
    /// Number of trade records, buys and sells alike.
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_percent: Decimal,
    /// Commission paid across all fills.
    pub total_commission: Decimal,
    /// Bars fed through the simulation loop.
    pub bars_processed: usize,
    /// Trade log.
    pub trades: Vec<TradeRecord>,
    /// Equity after each bar, plus one sample after a forced final close.
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    /// Check if the backtest was profitable.
    pub fn is_profitable(&self) -> bool {
        self.final_balance > self.initial_balance
    }

    pub fn net_profit(&self) -> Decimal {
        self.final_balance - self.initial_balance
    }
}

/// Running peak and worst peak-to-trough decline of an equity path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawdownTracker {
    peak: Decimal,
    max_drawdown_percent: Decimal,
}

impl DrawdownTracker {
    /// Start tracking with `initial` as the first peak.
    pub fn new(initial: Decimal) -> Self {
        Self {
            peak: initial,
            max_drawdown_percent: Decimal::ZERO,
        }
    }

    /// Feed the next equity sample.
    pub fn update(&mut self, equity: Decimal) {
        if equity > self.peak {
            self.peak = equity;
        } else if equity < self.peak && self.peak > Decimal::ZERO {
            let drawdown = (self.peak - equity) / self.peak * Decimal::ONE_HUNDRED;
            self.max_drawdown_percent = self.max_drawdown_percent.max(drawdown);
        }
    }

    pub fn peak(&self) -> Decimal {
        self.peak
    }

    pub fn max_drawdown_percent(&self) -> Decimal {
        self.max_drawdown_percent
    }
}

/// Maximum drawdown, in percent, of an equity path whose first sample is
/// the starting peak. Zero for an empty or never-declining path.
pub fn max_drawdown_percent(equity: &[Decimal]) -> Decimal {
    let Some((first, rest)) = equity.split_first() else {
        return Decimal::ZERO;
    };

    let mut tracker = DrawdownTracker::new(*first);
    for value in rest {
        tracker.update(*value);
    }
    tracker.max_drawdown_percent()
}

/// Win/loss counts from the trade log.
///
/// Each sell is compared with the most recent buy price before it: a higher
/// sell price wins, anything else loses. Sells without an earlier buy are
/// not attributed.
pub fn win_loss(trades: &[TradeRecord]) -> (usize, usize) {
    let mut last_buy: Option<Decimal> = None;
    let mut winning = 0;
    let mut losing = 0;

    for trade in trades {
        match trade.trade_type {
            TradeType::Buy => last_buy = Some(trade.price),
            TradeType::Sell => match last_buy {
                Some(buy_price) if trade.price > buy_price => winning += 1,
                Some(_) => losing += 1,
                None => {}
            },
        }
    }

    (winning, losing)
}

/// Inputs to [`aggregate`] that are not derived from the trade log.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub strategy_name: String,
    pub symbol: String,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub max_drawdown_percent: Decimal,
    pub bars_processed: usize,
}

/// Build the result for a finished run. Pure; calling it again on the same
/// inputs yields the same result.
pub fn aggregate(
    summary: RunSummary,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
) -> BacktestResult {
    let total_return_percent = if summary.initial_balance.is_zero() {
        Decimal::ZERO
    } else {
        (summary.final_balance - summary.initial_balance) / summary.initial_balance
            * Decimal::ONE_HUNDRED
    };

    let (winning_trades, losing_trades) = win_loss(&trades);
    let total_trades = trades.len();
    let win_rate_percent = if total_trades == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(winning_trades) / Decimal::from(total_trades) * Decimal::ONE_HUNDRED
    };
    let total_commission = trades.iter().map(|t| t.commission).sum();

    BacktestResult {
        strategy_name: summary.strategy_name,
        symbol: summary.symbol,
        initial_balance: summary.initial_balance,
        final_balance: summary.final_balance,
        total_return_percent,
        max_drawdown_percent: summary.max_drawdown_percent,
        total_trades,
        winning_trades,
        losing_trades,
        win_rate_percent,
        total_commission,
        bars_processed: summary.bars_processed,
        trades,
        equity_curve,
    }
}
