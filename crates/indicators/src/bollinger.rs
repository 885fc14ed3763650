//! Bollinger Bands.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::moving_average::sma;

/// Upper, middle and lower band at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerBands {
    /// Distance between the upper and lower band.
    pub fn width(&self) -> Decimal {
        self.upper - self.lower
    }
}

/// SMA(period) plus and minus `std_dev_multiplier` population standard
/// deviations of the last `period` values.
pub fn bollinger_bands(
    values: &[Decimal],
    period: usize,
    std_dev_multiplier: Decimal,
) -> Option<BollingerBands> {
    let middle = sma(values, period)?;

    let window = &values[values.len() - period..];
    let variance = window
        .iter()
        .map(|v| (*v - middle) * (*v - middle))
        .sum::<Decimal>()
        / Decimal::from(period);
    let std_dev = variance.sqrt()?;

    let offset = std_dev * std_dev_multiplier;
    Some(BollingerBands {
        upper: middle + offset,
        middle,
        lower: middle - offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bollinger_insufficient_data() {
        assert!(bollinger_bands(&[dec!(1), dec!(2)], 3, dec!(2)).is_none());
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population variance 4, std dev 2
        let values = vec![dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let bands = bollinger_bands(&values, 8, dec!(2)).unwrap();
        assert_eq!(bands.middle, dec!(5));
        assert_eq!(bands.upper, dec!(9));
        assert_eq!(bands.lower, dec!(1));
        assert_eq!(bands.width(), dec!(8));
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let values = vec![dec!(10); 20];
        let bands = bollinger_bands(&values, 20, dec!(2)).unwrap();
        assert_eq!(bands.upper, dec!(10));
        assert_eq!(bands.lower, dec!(10));
    }

    #[test]
    fn test_bollinger_uses_trailing_window() {
        let mut values = vec![dec!(1000); 5];
        values.extend(vec![dec!(10); 4]);
        let bands = bollinger_bands(&values, 4, dec!(2)).unwrap();
        assert_eq!(bands.middle, dec!(10));
    }
}
