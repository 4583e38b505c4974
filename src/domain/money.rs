use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid money value {input:?}: {reason}")]
    Parse { input: String, reason: String },
    #[error("money arithmetic overflow")]
    Overflow,
    #[error("{0} cannot be represented exactly")]
    Inexact(String),
}

/// An exact base-10 monetary value.
///
/// Wraps `rust_decimal::Decimal` so that repeated additions and subtractions never
/// accumulate rounding error. The scale of the input is preserved: `"100.00"` minus
/// `"30.00"` renders as `"70.00"`. On the wire the value is always decimal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses a decimal numeral such as `"100.00"`, `"-3"` or `"0.0001"`.
    ///
    /// Anything that is not a plain decimal numeral is rejected, including the empty
    /// string, exponent notation and digit separators.
    pub fn parse(text: &str) -> Result<Self, MoneyError> {
        let trimmed = text.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed
                .strip_prefix(['-', '+'])
                .unwrap_or(trimmed)
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
            && trimmed.chars().any(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(MoneyError::Parse {
                input: text.to_string(),
                reason: "not a decimal numeral".to_string(),
            });
        }

        Decimal::from_str_exact(trimmed)
            .map(Self)
            .map_err(|e| MoneyError::Parse {
                input: text.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_non_negative(&self) -> bool {
        self.0 >= Decimal::ZERO
    }

    /// Exact sum. Fails rather than round when the result would need more than 28
    /// significant digits.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        let sum = self.0.checked_add(other.0).ok_or(MoneyError::Overflow)?;
        Self::exact(sum, self, other, sum.checked_sub(other.0), "sum")
    }

    /// Exact difference, with the same guarantee as [`Money::checked_add`].
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        let difference = self.0.checked_sub(other.0).ok_or(MoneyError::Overflow)?;
        Self::exact(
            difference,
            self,
            other,
            difference.checked_add(other.0),
            "difference",
        )
    }

    // `Decimal` rounds away low digits instead of failing once the mantissa is full. A
    // rounded result has a smaller scale than its operands, or does not invert.
    fn exact(
        result: Decimal,
        lhs: Self,
        rhs: Self,
        inverse: Option<Decimal>,
        what: &str,
    ) -> Result<Self, MoneyError> {
        let scale_kept = result.scale() >= lhs.0.scale().max(rhs.0.scale());
        if scale_kept && inverse == Some(lhs.0) {
            Ok(Self(result))
        } else {
            Err(MoneyError::Inexact(format!("{what} of {lhs} and {rhs}")))
        }
    }
}

// Ordering compares numeric value only; "1.0" and "1.00" are equal.
impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_and_display_round_trip() {
        for text in ["100.00", "0.00", "0.0001", "-5.5", "42"] {
            let money = Money::parse(text).unwrap();
            assert_eq!(money.to_string(), text);
            assert_eq!(Money::parse(&money.to_string()).unwrap(), money);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for text in ["", "   ", "abc", "1e5", "1_000", "12.3.4", "--1", "."] {
            assert!(
                matches!(Money::parse(text), Err(MoneyError::Parse { .. })),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_failure_is_not_zero() {
        assert!(Money::parse("not_a_number").is_err());
        assert!("not_a_number".parse::<Money>().is_err());
    }

    #[test]
    fn test_sign_predicates() {
        let positive = Money::parse("0.01").unwrap();
        let zero = Money::parse("0.00").unwrap();
        let negative = Money::parse("-0.01").unwrap();

        assert!(positive.is_positive());
        assert!(positive.is_non_negative());
        assert!(!zero.is_positive());
        assert!(zero.is_non_negative());
        assert!(!negative.is_positive());
        assert!(!negative.is_non_negative());
    }

    #[test]
    fn test_exact_arithmetic() {
        let a = Money::new(dec!(0.1));
        let b = Money::new(dec!(0.2));
        assert_eq!(a.checked_add(b).unwrap(), Money::new(dec!(0.3)));

        let balance = Money::parse("100.00").unwrap();
        let amount = Money::parse("30.00").unwrap();
        assert_eq!(balance.checked_sub(amount).unwrap().to_string(), "70.00");
        assert_eq!(Money::ZERO.checked_add(amount).unwrap().to_string(), "30.00");
    }

    #[test]
    fn test_repeated_cycles_do_not_drift() {
        let start = Money::parse("10.00").unwrap();
        let step = Money::parse("0.01").unwrap();
        let mut value = start;
        for _ in 0..10_000 {
            value = value.checked_add(step).unwrap();
        }
        for _ in 0..10_000 {
            value = value.checked_sub(step).unwrap();
        }
        assert_eq!(value, start);
    }

    #[test]
    fn test_overflow_is_reported() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(
            max.checked_add(Money::new(dec!(1))),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_sum_past_precision_limit_is_rejected() {
        let large = Money::parse("9000000000000000000000000000").unwrap();
        let cents = Money::parse("0.10").unwrap();

        assert!(matches!(large.checked_add(cents), Err(MoneyError::Inexact(_))));
        assert!(matches!(large.checked_sub(cents), Err(MoneyError::Inexact(_))));
        assert!(matches!(cents.checked_sub(large), Err(MoneyError::Inexact(_))));
    }

    #[test]
    fn test_full_precision_results_stay_exact() {
        // 28 significant digits with mixed scales still fit.
        let a = Money::parse("999999999999999999999999.9999").unwrap();
        let b = Money::parse("0.0001").unwrap();
        assert_eq!(
            a.checked_sub(b).unwrap().to_string(),
            "999999999999999999999999.9998"
        );
        assert_eq!(
            a.checked_sub(b).unwrap().checked_add(b).unwrap(),
            a
        );

        let whole = Money::parse("7922816251426433759354395033").unwrap();
        assert_eq!(
            whole.checked_add(Money::parse("2").unwrap()).unwrap().to_string(),
            "7922816251426433759354395035"
        );
    }

    #[test]
    fn test_compare_ignores_scale() {
        let a = Money::parse("1.0").unwrap();
        let b = Money::parse("1.00").unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert!(Money::parse("10.00").unwrap() < Money::parse("10.01").unwrap());
    }

    #[test]
    fn test_serde_uses_decimal_text() {
        let money = Money::parse("100.00").unwrap();
        assert_eq!(serde_json::to_string(&money).unwrap(), "\"100.00\"");

        let parsed: Money = serde_json::from_str("\"12.34\"").unwrap();
        assert_eq!(parsed, Money::new(dec!(12.34)));

        assert!(serde_json::from_str::<Money>("\"twelve\"").is_err());
    }
}
