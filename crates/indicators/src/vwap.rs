//! Volume-weighted average price.

use market_core::types::MarketBar;
use rust_decimal::Decimal;

/// VWAP over the last `period` bars: sum(typical price * volume) / sum(volume).
///
/// The window is rolling, not anchored to a trading session. Returns `None`
/// when the window is short or carries no volume.
pub fn vwap(bars: &[MarketBar], period: usize) -> Option<Decimal> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let window = &bars[bars.len() - period..];
    let (weighted, volume) = window.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(weighted, volume), bar| (weighted + bar.typical_price() * bar.volume, volume + bar.volume),
    );

    if volume.is_zero() {
        return None;
    }

    Some(weighted / volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn bar(price: Decimal, volume: Decimal) -> MarketBar {
        MarketBar::new(Utc::now(), price, price, price, price, volume)
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let bars = vec![bar(dec!(10), dec!(100)), bar(dec!(20), dec!(300))];
        // (10*100 + 20*300) / 400 = 17.5
        assert_eq!(vwap(&bars, 2), Some(dec!(17.5)));
    }

    #[test]
    fn test_vwap_rolling_window() {
        let bars = vec![
            bar(dec!(1000), dec!(1000)),
            bar(dec!(10), dec!(1)),
            bar(dec!(20), dec!(1)),
        ];
        assert_eq!(vwap(&bars, 2), Some(dec!(15)));
    }

    #[test]
    fn test_vwap_zero_volume_is_undefined() {
        let bars = vec![bar(dec!(10), Decimal::ZERO); 3];
        assert_eq!(vwap(&bars, 3), None);
        assert_eq!(vwap(&bars, 4), None);
    }
}
