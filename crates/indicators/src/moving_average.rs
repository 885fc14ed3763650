//! Simple and exponential moving averages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Moving average flavour used by crossover strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverageType {
    #[default]
    Simple,
    Exponential,
}

impl MovingAverageType {
    /// Value of this moving average at the end of `values`.
    pub fn compute(&self, values: &[Decimal], period: usize) -> Option<Decimal> {
        match self {
            MovingAverageType::Simple => sma(values, period),
            MovingAverageType::Exponential => ema(values, period),
        }
    }
}

/// Mean of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

/// Exponential moving average series, seeded with the SMA of the first
/// `period` values. Element `i` is the EMA ending at `values[i + period - 1]`.
pub fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = Decimal::TWO / Decimal::from(period + 1);
    let seed: Decimal = values[..period].iter().sum::<Decimal>() / Decimal::from(period);

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);

    let mut prev = seed;
    for value in &values[period..] {
        prev = (*value - prev) * k + prev;
        series.push(prev);
    }

    series
}

/// EMA at the end of `values`.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    ema_series(values, period).last().copied()
}
