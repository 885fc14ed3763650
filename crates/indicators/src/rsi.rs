//! Relative Strength Index with Wilder smoothing.

use rust_decimal::Decimal;

/// RSI at the end of `closes`, in `[0, 100]`.
///
/// Needs `period + 1` closes. The first average gain/loss is the simple mean
/// of the first `period` changes; later changes are folded in with Wilder's
/// `(prev * (period - 1) + current) / period`. An average loss of zero yields
/// 100.
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let period_dec = Decimal::from(period);
    let changes: Vec<Decimal> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (mut avg_gain, mut avg_loss) = changes[..period]
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(gain, loss), change| {
            if *change > Decimal::ZERO {
                (gain + *change, loss)
            } else {
                (gain, loss - *change)
            }
        });
    avg_gain /= period_dec;
    avg_loss /= period_dec;

    let smoothing = Decimal::from(period - 1);
    for change in &changes[period..] {
        let gain = (*change).max(Decimal::ZERO);
        let loss = (-*change).max(Decimal::ZERO);
        avg_gain = (avg_gain * smoothing + gain) / period_dec;
        avg_loss = (avg_loss * smoothing + loss) / period_dec;
    }

    if avg_loss == Decimal::ZERO {
        return Some(Decimal::ONE_HUNDRED);
    }

    let rs = avg_gain / avg_loss;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}
