//! OHLCV market bars.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. Sequences of bars are expected in ascending
/// timestamp order; nothing in the engine reorders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBar {
    /// Bar open time.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Exchange-reported VWAP for the bar, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<Decimal>,
    /// Number of trades aggregated into the bar, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<u64>,
}

impl MarketBar {
    /// Create a new bar without the optional exchange fields.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            vwap: None,
            trade_count: None,
        }
    }

    /// Typical price `(high + low + close) / 3`.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}

/// Returns true when the bars are in non-decreasing timestamp order.
pub fn is_time_ordered(bars: &[MarketBar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn bar_at(minutes: i64, close: Decimal) -> MarketBar {
        let ts = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(minutes);
        MarketBar::new(ts, close, close, close, close, dec!(1))
    }

    #[test]
    fn test_typical_price() {
        let bar = MarketBar::new(Utc::now(), dec!(10), dec!(12), dec!(9), dec!(12), dec!(100));
        assert_eq!(bar.typical_price(), dec!(11));
    }

    #[test]
    fn test_time_ordering() {
        let ordered = vec![bar_at(0, dec!(1)), bar_at(1, dec!(2)), bar_at(5, dec!(3))];
        assert!(is_time_ordered(&ordered));

        let unordered = vec![bar_at(5, dec!(1)), bar_at(1, dec!(2))];
        assert!(!is_time_ordered(&unordered));
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let bar = bar_at(0, dec!(100));
        let json = serde_json::to_string(&bar).unwrap();
        assert!(!json.contains("vwap"));

        let with_extras = MarketBar {
            vwap: Some(dec!(99.5)),
            trade_count: Some(42),
            ..bar
        };
        let json = serde_json::to_string(&with_extras).unwrap();
        let parsed: MarketBar = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vwap, Some(dec!(99.5)));
        assert_eq!(parsed.trade_count, Some(42));
    }
}
