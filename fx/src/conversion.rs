//! Margin arithmetic and conversion records.

use chrono::{DateTime, Utc};
use ratekit_common::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FxError, FxResult};

/// Apply a percentage markdown: `rate * (1 - margin/100)`.
///
/// A negative margin raises the rate. A margin of 100 or more gives a zero
/// or negative rate and is not clamped.
pub fn apply_margin(rate: Decimal, margin_percent: Decimal) -> FxResult<Decimal> {
    Decimal::ONE
        .checked_sub(margin_percent / Decimal::ONE_HUNDRED)
        .and_then(|factor| rate.checked_mul(factor))
        .ok_or(FxError::Overflow("margin"))
}

/// The rate a conversion actually uses.
///
/// Only a positive margin is applied; zero and negative margins convert at
/// the plain rate.
pub fn effective_rate(rate: Decimal, margin_percent: Decimal) -> FxResult<Decimal> {
    if margin_percent > Decimal::ZERO {
        apply_margin(rate, margin_percent)
    } else {
        Ok(rate)
    }
}

/// `amount * rate`, failing instead of overflowing.
pub fn multiply(amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
    amount.checked_mul(rate).ok_or(FxError::Overflow("convert"))
}

/// `amount / rate`, failing instead of overflowing.
pub fn divide(amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
    amount.checked_div(rate).ok_or(FxError::Overflow("convert_to_base"))
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Input amount, in the base currency.
    pub input: Money,
    /// Output amount, in the target currency.
    pub output: Money,
    /// Plain rate from the table.
    pub rate: Decimal,
    /// Margin in effect when the conversion ran.
    pub margin_percent: Decimal,
    /// Rate that was multiplied in.
    pub effective_rate: Decimal,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl Conversion {
    /// Convert `input` into `target` at `rate` with `margin_percent`.
    pub fn compute(
        input: Money,
        target: Currency,
        rate: Decimal,
        margin_percent: Decimal,
    ) -> FxResult<Self> {
        let effective_rate = effective_rate(rate, margin_percent)?;
        let output = Money::new(multiply(input.value, effective_rate)?, target);

        Ok(Self {
            id: Uuid::now_v7(),
            input,
            output,
            rate,
            margin_percent,
            effective_rate,
            executed_at: Utc::now(),
        })
    }

    /// The amount lost to the margin, in the target currency.
    pub fn margin_cost(&self) -> FxResult<Decimal> {
        self.rate
            .checked_sub(self.effective_rate)
            .and_then(|spread| self.input.value.checked_mul(spread))
            .ok_or(FxError::Overflow("margin_cost"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_margin() {
        assert_eq!(apply_margin(dec!(0.9), dec!(3.5)).unwrap(), dec!(0.8685));
        assert_eq!(apply_margin(dec!(0.9), Decimal::ZERO).unwrap(), dec!(0.9));
        assert_eq!(apply_margin(dec!(0.9), dec!(-10)).unwrap(), dec!(0.99));
    }

    #[test]
    fn test_margin_of_100_or_more_is_not_clamped() {
        assert_eq!(apply_margin(dec!(0.9), dec!(100)).unwrap(), Decimal::ZERO);
        assert_eq!(apply_margin(dec!(0.9), dec!(150)).unwrap(), dec!(-0.45));
    }

    #[test]
    fn test_effective_rate_ignores_non_positive_margin() {
        assert_eq!(effective_rate(dec!(0.9), dec!(3.5)).unwrap(), dec!(0.8685));
        assert_eq!(effective_rate(dec!(0.9), Decimal::ZERO).unwrap(), dec!(0.9));
        assert_eq!(effective_rate(dec!(0.9), dec!(-10)).unwrap(), dec!(0.9));
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        assert!(matches!(
            multiply(Decimal::MAX, dec!(150.25)),
            Err(FxError::Overflow("convert"))
        ));
        assert!(matches!(
            divide(Decimal::MAX, dec!(0.0000001)),
            Err(FxError::Overflow("convert_to_base"))
        ));
        assert!(matches!(
            apply_margin(Decimal::MAX, dec!(-50)),
            Err(FxError::Overflow("margin"))
        ));

        let input = Money::new(Decimal::MAX, Currency::usd());
        assert!(Conversion::compute(input, Currency::jpy(), dec!(150.25), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_conversion_record() {
        let input = Money::new(dec!(100), Currency::usd());
        let conversion = Conversion::compute(input, Currency::eur(), dec!(0.92), dec!(3.5)).unwrap();

        assert_eq!(conversion.output.currency, Currency::eur());
        assert_eq!(conversion.effective_rate, dec!(0.8878));
        assert_eq!(conversion.output.value, dec!(88.78));
        assert_eq!(conversion.margin_cost().unwrap(), dec!(3.22));
    }

    #[test]
    fn test_conversion_serializes() {
        let input = Money::new(dec!(10), Currency::usd());
        let conversion = Conversion::compute(input, Currency::jpy(), dec!(150), Decimal::ZERO).unwrap();

        let json = serde_json::to_value(&conversion).unwrap();
        assert_eq!(json["output"]["currency"], "JPY");
        assert_eq!(json["input"]["currency"], "USD");
    }

    proptest! {
        #[test]
        fn prop_positive_margin_lowers_rate(
            rate_micros in 1i64..1_000_000_000,
            margin_bps in 1i64..10_000,
        ) {
            let rate = Decimal::new(rate_micros, 6);
            let margin = Decimal::new(margin_bps, 2);
            let effective = effective_rate(rate, margin).unwrap();

            prop_assert!(effective < rate);
            prop_assert!(effective > Decimal::ZERO);
        }

        #[test]
        fn prop_zero_margin_is_identity(rate_micros in 1i64..1_000_000_000) {
            let rate = Decimal::new(rate_micros, 6);
            prop_assert_eq!(effective_rate(rate, Decimal::ZERO).unwrap(), rate);
        }
    }
}
