use crate::error::AllocationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217-style currency code.
///
/// # Examples
///
/// ```
/// use payment_allocator::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let eur = CurrencyCode::new("EUR");
/// assert_ne!(usd, eur);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Accumulates the amount-weighted average of the exchange rates carried by
/// the transfer portions that funded one obligation.
///
/// A rate is expressed as units of the obligation currency per one unit of
/// the reporting currency, so `amount / rate` converts into the reporting
/// currency. Portions drawn from transfers without a rate are not weighted.
///
/// # Examples
///
/// ```
/// use payment_allocator::core::currency::RateBlend;
/// use rust_decimal_macros::dec;
///
/// let mut blend = RateBlend::new();
/// blend.add(dec!(600), Some(dec!(1.20))).unwrap();
/// blend.add(dec!(400), Some(dec!(1.10))).unwrap();
/// assert_eq!(blend.weighted_rate(), Some(dec!(1.16)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateBlend {
    weighted_sum: Decimal,
    rated_amount: Decimal,
    converted: Decimal,
}

impl RateBlend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one funded portion. On overflow the blend is left as it was.
    pub fn add(&mut self, amount: Decimal, rate: Option<Decimal>) -> Result<(), AllocationError> {
        let Some(rate) = rate.filter(|r| *r > Decimal::ZERO) else {
            return Ok(());
        };
        let overflow = || AllocationError::Overflow {
            context: "rate weighting",
        };
        let weighted_sum = rate
            .checked_mul(amount)
            .and_then(|w| self.weighted_sum.checked_add(w))
            .ok_or_else(overflow)?;
        let rated_amount = self
            .rated_amount
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let converted = amount
            .checked_div(rate)
            .and_then(|c| self.converted.checked_add(c))
            .ok_or_else(overflow)?;

        self.weighted_sum = weighted_sum;
        self.rated_amount = rated_amount;
        self.converted = converted;
        Ok(())
    }

    /// Whether any rated portion has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rated_amount == Decimal::ZERO
    }

    /// Amount-weighted average rate over the rated portions.
    pub fn weighted_rate(&self) -> Option<Decimal> {
        if self.is_empty() {
            return None;
        }
        // bounded by the largest rate recorded
        self.weighted_sum.checked_div(self.rated_amount)
    }

    /// Sum of each rated portion converted at its own rate.
    pub fn per_portion_converted(&self) -> Option<Decimal> {
        if self.is_empty() {
            return None;
        }
        Some(self.converted)
    }
}

/// Convert an amount at a rate and round to `scale` decimal places
/// (banker's rounding). `None` for a non-positive rate or when the
/// quotient does not fit a `Decimal`.
pub fn convert(amount: Decimal, rate: Decimal, scale: u32) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }
    amount.checked_div(rate).map(|c| c.round_dp(scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_equality() {
        let a = CurrencyCode::new("USD");
        let b = CurrencyCode::new("USD");
        assert_eq!(a, b);
    }

    #[test]
    fn test_blend_single_rate() {
        let mut blend = RateBlend::new();
        blend.add(dec!(1000), Some(dec!(1.25))).unwrap();
        assert_eq!(blend.weighted_rate(), Some(dec!(1.25)));
        assert_eq!(blend.per_portion_converted(), Some(dec!(800)));
    }

    #[test]
    fn test_blend_ignores_unrated_portions() {
        let mut blend = RateBlend::new();
        blend.add(dec!(500), None).unwrap();
        blend.add(dec!(500), Some(dec!(1.10))).unwrap();
        assert_eq!(blend.weighted_rate(), Some(dec!(1.10)));
    }

    #[test]
    fn test_blend_empty() {
        let mut blend = RateBlend::new();
        blend.add(dec!(500), None).unwrap();
        assert!(blend.is_empty());
        assert_eq!(blend.weighted_rate(), None);
        assert_eq!(blend.per_portion_converted(), None);
    }

    #[test]
    fn test_convert_rounds_half_even() {
        // 1000 / 1.16 = 862.0689...
        assert_eq!(convert(dec!(1000), dec!(1.16), 2), Some(dec!(862.07)));
        // 0.125 rounds to even
        assert_eq!(convert(dec!(0.125), dec!(1), 2), Some(dec!(0.12)));
    }

    #[test]
    fn test_convert_rejects_non_positive_rate() {
        assert_eq!(convert(dec!(10), Decimal::ZERO, 2), None);
        assert_eq!(convert(dec!(10), dec!(-1), 2), None);
    }

    #[test]
    fn test_blend_overflow_leaves_state() {
        let mut blend = RateBlend::new();
        blend.add(dec!(100), Some(dec!(2))).unwrap();

        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let err = blend.add(huge, Some(Decimal::from(10_000_000_000i64))).unwrap_err();
        assert_eq!(err, AllocationError::Overflow { context: "rate weighting" });
        assert_eq!(blend.weighted_rate(), Some(dec!(2)));
        assert_eq!(blend.per_portion_converted(), Some(dec!(50)));
    }

    #[test]
    fn test_convert_overflow_is_none() {
        assert_eq!(convert(Decimal::MAX, dec!(0.5), 2), None);
    }
}
