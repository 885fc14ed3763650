//! Volume averages and confirmation.

use market_core::types::MarketBar;
use rust_decimal::Decimal;

/// Mean volume of the last `lookback` bars.
pub fn average_volume(bars: &[MarketBar], lookback: usize) -> Option<Decimal> {
    if lookback == 0 || bars.len() < lookback {
        return None;
    }

    let total: Decimal = bars[bars.len() - lookback..].iter().map(|b| b.volume).sum();
    Some(total / Decimal::from(lookback))
}

/// Whether the last bar's volume is at least `multiplier` times the average
/// volume of up to `lookback` bars preceding it. A window with no prior bars
/// cannot confirm.
pub fn volume_confirmed(bars: &[MarketBar], lookback: usize, multiplier: Decimal) -> bool {
    let Some((current, history)) = bars.split_last() else {
        return false;
    };

    let window = lookback.min(history.len());
    match average_volume(history, window) {
        Some(avg) => current.volume >= avg * multiplier,
        None => false,
    }
}
