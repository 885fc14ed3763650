//! Open position state tracked by the simulator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A long position in the single instrument of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Units held.
    pub quantity: Decimal,
    /// Fill price of the opening buy.
    pub entry_price: Decimal,
    /// Timestamp of the bar the position was opened on.
    pub entry_time: DateTime<Utc>,
    /// Mark-to-market value at the latest close.
    pub current_value: Decimal,
    /// `current_value - quantity * entry_price`.
    pub unrealized_pnl: Decimal,
    /// Price at which the simulator force-sells the position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
}

impl Position {
    /// Open a position valued at its entry price.
    pub fn open(quantity: Decimal, entry_price: Decimal, entry_time: DateTime<Utc>) -> Self {
        Self {
            quantity,
            entry_price,
            entry_time,
            current_value: quantity * entry_price,
            unrealized_pnl: Decimal::ZERO,
            stop_price: None,
        }
    }

    /// Attach a stop price.
    pub fn with_stop_price(mut self, stop_price: Option<Decimal>) -> Self {
        self.stop_price = stop_price;
        self
    }

    /// Value paid for the units, excluding commission.
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    /// Revalue the position at `price`.
    pub fn mark_to_market(&mut self, price: Decimal) {
        self.current_value = self.quantity * price;
        self.unrealized_pnl = self.current_value - self.cost_basis();
    }

    /// Whether a bar trading down to `low` reaches the stop.
    pub fn is_stopped_out(&self, low: Decimal) -> bool {
        self.stop_price.map(|stop| low <= stop).unwrap_or(false)
    }
}
