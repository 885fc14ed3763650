//! Executed trade log entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reason recorded on a sell forced by the stop-loss check.
pub const STOP_LOSS_REASON: &str = "Stop Loss";

/// Reason recorded on the sell that closes a position left open after the last bar.
pub const FINAL_CLOSE_REASON: &str = "Final Close";

/// Side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

/// Record of a fill executed during a backtest. Appended, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub exchange: String,
    pub trade_type: TradeType,
    /// Fill price.
    pub price: Decimal,
    pub quantity: Decimal,
    /// `price * quantity`.
    pub value: Decimal,
    /// Commission paid on this fill.
    pub commission: Decimal,
    /// Timestamp of the bar the fill happened on.
    pub execution_timestamp: DateTime<Utc>,
    pub reason: String,
}

impl TradeRecord {
    pub fn is_buy(&self) -> bool {
        self.trade_type == TradeType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.trade_type == TradeType::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(trade_type: TradeType) -> TradeRecord {
        TradeRecord {
            symbol: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            trade_type,
            price: dec!(100),
            quantity: dec!(2),
            value: dec!(200),
            commission: dec!(0.2),
            execution_timestamp: Utc::now(),
            reason: STOP_LOSS_REASON.to_string(),
        }
    }

    #[test]
    fn test_trade_side() {
        assert!(sample(TradeType::Buy).is_buy());
        assert!(!sample(TradeType::Buy).is_sell());
        assert!(sample(TradeType::Sell).is_sell());
    }

    #[test]
    fn test_trade_type_serialization() {
        let json = serde_json::to_value(sample(TradeType::Sell)).unwrap();
        assert_eq!(json["trade_type"], "sell");
        assert_eq!(json["reason"], "Stop Loss");
    }
}
