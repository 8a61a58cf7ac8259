//! Fixed-precision monetary values.
//!
//! Loan amounts are stored as `NUMERIC(10,2)` and estate line items as
//! `NUMERIC(9,2)`. Both newtypes check the precision up front so that an
//! out-of-range value becomes a field error instead of a database error.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a decimal against a column precision.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Too many digits in total.
    #[error("Ensure that there are no more than {max} digits in total.")]
    TooManyDigits {
        /// Maximum number of digits.
        max: u32,
    },
    /// Too many digits after the decimal point.
    #[error("Ensure that there are no more than {max} decimal places.")]
    TooManyDecimalPlaces {
        /// Maximum number of decimal places.
        max: u32,
    },
    /// Too many digits before the decimal point.
    #[error("Ensure that there are no more than {max} digits before the decimal point.")]
    TooManyWholeDigits {
        /// Maximum number of whole digits.
        max: u32,
    },
}

/// Count whole and fractional digits, ignoring trailing zeros.
fn digit_counts(value: Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let fractional = normalized.scale();
    let mantissa = normalized.mantissa().unsigned_abs();
    let total = if mantissa == 0 {
        1
    } else {
        u32::try_from(mantissa.to_string().len()).unwrap_or(u32::MAX)
    };
    (total.saturating_sub(fractional), fractional)
}

/// Check a value against `NUMERIC(max_digits, places)`.
fn check_precision(value: Decimal, max_digits: u32, places: u32) -> Result<(), DecimalError> {
    let (whole, fractional) = digit_counts(value);
    if whole + fractional > max_digits && fractional <= places {
        return Err(DecimalError::TooManyDigits { max: max_digits });
    }
    if fractional > places {
        return Err(DecimalError::TooManyDecimalPlaces { max: places });
    }
    if whole > max_digits - places {
        return Err(DecimalError::TooManyWholeDigits {
            max: max_digits - places,
        });
    }
    Ok(())
}

macro_rules! define_decimal {
    ($(#[$meta:meta])* $name:ident, $digits:expr, $places:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "Decimal", into = "Decimal")]
        pub struct $name(Decimal);

        impl $name {
            /// Total number of digits allowed.
            pub const MAX_DIGITS: u32 = $digits;
            /// Number of digits allowed after the decimal point.
            pub const DECIMAL_PLACES: u32 = $places;

            /// Validate a decimal against the column precision.
            ///
            /// The stored value is rescaled to exactly two decimal places.
            ///
            /// # Errors
            ///
            /// Returns a [`DecimalError`] describing the first precision rule broken.
            pub fn new(value: Decimal) -> Result<Self, DecimalError> {
                check_precision(value, Self::MAX_DIGITS, Self::DECIMAL_PLACES)?;
                let mut value = value.normalize();
                value.rescale(Self::DECIMAL_PLACES);
                Ok(Self(value))
            }

            /// Get the underlying decimal.
            #[must_use]
            pub const fn value(&self) -> Decimal {
                self.0
            }
        }

        impl TryFrom<Decimal> for $name {
            type Error = DecimalError;

            fn try_from(value: Decimal) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for Decimal {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let value = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                // Column precision already enforced by the database
                Ok(Self(value))
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_decimal!(
    /// The principal of a loan application, `NUMERIC(10,2)`.
    ///
    /// ```
    /// use estate_desk_core::LoanAmount;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(LoanAmount::new(Decimal::new(1_234_567, 2)).is_ok());      // 12345.67
    /// assert!(LoanAmount::new(Decimal::new(1_234_567, 3)).is_err());     // 1234.567
    /// assert!(LoanAmount::new(Decimal::new(123_456_789, 0)).is_err());   // 9 whole digits
    /// ```
    LoanAmount,
    10,
    2
);

define_decimal!(
    /// The value of a single asset or expense line item, `NUMERIC(9,2)`.
    LineItemValue,
    9,
    2
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_loan_amount_accepts_two_places() {
        let amount = LoanAmount::new(dec("12345.67")).unwrap();
        assert_eq!(amount.to_string(), "12345.67");
    }

    #[test]
    fn test_loan_amount_is_rescaled() {
        assert_eq!(LoanAmount::new(dec("350000")).unwrap().to_string(), "350000.00");
        assert_eq!(LoanAmount::new(dec("10.500")).unwrap().to_string(), "10.50");
    }

    #[test]
    fn test_loan_amount_rejects_three_places() {
        assert_eq!(
            LoanAmount::new(dec("1.234")),
            Err(DecimalError::TooManyDecimalPlaces { max: 2 })
        );
    }

    #[test]
    fn test_loan_amount_rejects_too_many_whole_digits() {
        assert_eq!(
            LoanAmount::new(dec("123456789")),
            Err(DecimalError::TooManyWholeDigits { max: 8 })
        );
        assert!(LoanAmount::new(dec("99999999.99")).is_ok());
    }

    #[test]
    fn test_line_item_value_precision() {
        assert!(LineItemValue::new(dec("9999999.99")).is_ok());
        assert_eq!(
            LineItemValue::new(dec("10000000")),
            Err(DecimalError::TooManyWholeDigits { max: 7 })
        );
    }

    #[test]
    fn test_zero_and_fractions() {
        assert!(LoanAmount::new(Decimal::ZERO).is_ok());
        assert!(LineItemValue::new(dec("0.05")).is_ok());
    }

    #[test]
    fn test_serializes_as_string() {
        let amount = LoanAmount::new(dec("12345.67")).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"12345.67\"");
    }

    #[test]
    fn test_deserializes_from_string_or_number() {
        let from_str: LoanAmount = serde_json::from_str("\"100.5\"").unwrap();
        assert_eq!(from_str.to_string(), "100.50");

        let from_num: LineItemValue = serde_json::from_str("100.0").unwrap();
        assert_eq!(from_num.to_string(), "100.00");

        let bad: Result<LoanAmount, _> = serde_json::from_str("\"1.001\"");
        assert!(bad.is_err());
    }
}
