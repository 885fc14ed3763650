//! Moving Average Convergence Divergence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::moving_average::ema_series;

/// One MACD sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdValue {
    /// `EMA(fast) - EMA(slow)`.
    pub macd: Decimal,
    /// EMA of the MACD line over the signal period.
    pub signal: Decimal,
    /// `macd - signal`.
    pub histogram: Decimal,
}

/// MACD samples aligned to the end of `closes`; the last element is the
/// value at the final close. Empty when `closes` is shorter than
/// `slow + signal - 1` or when `fast >= slow`.
pub fn macd_series(
    closes: &[Decimal],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Vec<MacdValue> {
    if fast == 0 || signal == 0 || fast >= slow {
        return Vec::new();
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);
    if slow_ema.is_empty() {
        return Vec::new();
    }

    // fast_ema starts (slow - fast) closes earlier than slow_ema.
    let offset = slow - fast;
    let macd_line: Vec<Decimal> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, slow_value)| fast_ema[i + offset] - *slow_value)
        .collect();

    let signal_line = ema_series(&macd_line, signal);
    let signal_offset = signal - 1;

    signal_line
        .iter()
        .enumerate()
        .map(|(i, signal_value)| {
            let macd = macd_line[i + signal_offset];
            MacdValue {
                macd,
                signal: *signal_value,
                histogram: macd - *signal_value,
            }
        })
        .collect()
}

/// MACD at the final close.
pub fn macd(closes: &[Decimal], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    macd_series(closes, fast, slow, signal).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_macd_insufficient_data() {
        let closes: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        // needs 26 + 9 - 1 = 34 closes
        assert!(macd(&closes, 12, 26, 9).is_none());
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let closes: Vec<Decimal> = (1..=60).map(Decimal::from).collect();
        assert!(macd_series(&closes, 26, 12, 9).is_empty());
    }

    #[test]
    fn test_macd_series_length() {
        let closes: Vec<Decimal> = (1..=40).map(Decimal::from).collect();
        let series = macd_series(&closes, 12, 26, 9);
        assert_eq!(series.len(), 40 - 26 - 9 + 2);
    }

    #[test]
    fn test_macd_constant_series_is_zero() {
        let closes = vec![dec!(100); 40];
        let value = macd(&closes, 12, 26, 9).unwrap();
        assert_eq!(value.macd, Decimal::ZERO);
        assert_eq!(value.signal, Decimal::ZERO);
        assert_eq!(value.histogram, Decimal::ZERO);
    }

    #[test]
    fn test_macd_small_periods() {
        // fast 1 => EMA(1) is the close itself; slow 2 => k = 2/3.
        let closes = vec![dec!(1), dec!(3), dec!(3)];
        // slow ema: seed 2, then (3 - 2) * 2/3 + 2
        // macd line: [3 - 2, 3 - slow[1]]; signal 1 => signal == macd
        let series = macd_series(&closes, 1, 2, 1);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].macd, dec!(1));
        assert_eq!(series[0].histogram, Decimal::ZERO);
        assert!(series[1].macd > Decimal::ZERO);
        assert!(series[1].macd < dec!(1));
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let closes: Vec<Decimal> = (1..=50).map(Decimal::from).collect();
        let value = macd(&closes, 12, 26, 9).unwrap();
        assert!(value.macd > Decimal::ZERO);
    }
}
