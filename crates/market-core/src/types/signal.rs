//! Trading signals produced by strategies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reason attached to a hold when the bar window is too short.
pub const INSUFFICIENT_DATA: &str = "Insufficient data";

/// Action requested by a strategy for the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// A strategy decision for one bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    /// Requested fill price; the simulator uses the bar close when absent.
    pub entry_price: Option<Decimal>,
    /// Advisory stop-loss price for a buy.
    pub stop_loss: Option<Decimal>,
    /// Advisory take-profit price for a buy.
    pub take_profit: Option<Decimal>,
    /// Human-readable explanation.
    pub reason: String,
}

impl Signal {
    /// Do nothing this bar.
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            action: SignalAction::Hold,
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            reason: reason.into(),
        }
    }

    /// Hold because the bar window is too short for the strategy.
    pub fn insufficient_data() -> Self {
        Self::hold(INSUFFICIENT_DATA)
    }

    /// Open a position at `price`.
    pub fn buy(price: Decimal, reason: impl Into<String>) -> Self {
        Self {
            action: SignalAction::Buy,
            entry_price: Some(price),
            stop_loss: None,
            take_profit: None,
            reason: reason.into(),
        }
    }

    /// Close the open position at `price`.
    pub fn sell(price: Decimal, reason: impl Into<String>) -> Self {
        Self {
            action: SignalAction::Sell,
            entry_price: Some(price),
            stop_loss: None,
            take_profit: None,
            reason: reason.into(),
        }
    }

    /// Attach stop-loss and take-profit levels.
    pub fn with_exits(mut self, stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn is_buy(&self) -> bool {
        self.action == SignalAction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.action == SignalAction::Sell
    }

    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }
}
