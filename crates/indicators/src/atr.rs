//! Average True Range.

use market_core::types::MarketBar;
use rust_decimal::Decimal;

/// True Range = max(H-L, |H-Pc|, |L-Pc|). Without a previous close it is H-L.
pub fn true_range(bar: &MarketBar, prev_close: Option<Decimal>) -> Decimal {
    let hl = bar.high - bar.low;
    match prev_close {
        Some(prev) => {
            let hpc = (bar.high - prev).abs();
            let lpc = (bar.low - prev).abs();
            hl.max(hpc).max(lpc)
        }
        None => hl,
    }
}

/// Wilder-smoothed ATR at the last bar. Needs `period + 1` bars: the first
/// ATR is the mean of the first `period` true ranges (each against its
/// previous close), later ranges are folded in as
/// `(prev * (period - 1) + tr) / period`.
pub fn atr(bars: &[MarketBar], period: usize) -> Option<Decimal> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let true_ranges: Vec<Decimal> = bars
        .windows(2)
        .map(|w| true_range(&w[1], Some(w[0].close)))
        .collect();

    let period_dec = Decimal::from(period);
    let mut value = true_ranges[..period].iter().sum::<Decimal>() / period_dec;

    let smoothing = Decimal::from(period - 1);
    for tr in &true_ranges[period..] {
        value = (value * smoothing + *tr) / period_dec;
    }

    Some(value)
}
