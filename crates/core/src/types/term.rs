//! Loan term in months.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`LoanTerm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    /// Below the shortest allowed term.
    #[error("Ensure this value is greater than or equal to {min}.")]
    TooShort {
        /// Minimum allowed term.
        min: i32,
    },
    /// Above the longest allowed term.
    #[error("Ensure this value is less than or equal to {max}.")]
    TooLong {
        /// Maximum allowed term.
        max: i32,
    },
}

/// Repayment term of a loan application, in months (1 to 36 inclusive).
///
/// ```
/// use estate_desk_core::LoanTerm;
///
/// assert!(LoanTerm::new(12).is_ok());
/// assert!(LoanTerm::new(0).is_err());
/// assert!(LoanTerm::new(37).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct LoanTerm(i32);

impl LoanTerm {
    /// Shortest allowed term.
    pub const MIN: i32 = 1;
    /// Longest allowed term.
    pub const MAX: i32 = 36;

    /// Validate a term in months.
    ///
    /// # Errors
    ///
    /// Returns [`TermError`] when the value is outside `1..=36`.
    pub const fn new(months: i32) -> Result<Self, TermError> {
        if months < Self::MIN {
            return Err(TermError::TooShort { min: Self::MIN });
        }
        if months > Self::MAX {
            return Err(TermError::TooLong { max: Self::MAX });
        }
        Ok(Self(months))
    }

    /// Number of months.
    #[must_use]
    pub const fn months(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for LoanTerm {
    type Error = TermError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoanTerm> for i32 {
    fn from(term: LoanTerm) -> Self {
        term.0
    }
}

impl fmt::Display for LoanTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for LoanTerm {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for LoanTerm {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let months = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(months)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for LoanTerm {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(LoanTerm::new(1).is_ok());
        assert!(LoanTerm::new(36).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(LoanTerm::new(0), Err(TermError::TooShort { min: 1 }));
        assert_eq!(LoanTerm::new(-5), Err(TermError::TooShort { min: 1 }));
        assert_eq!(LoanTerm::new(37), Err(TermError::TooLong { max: 36 }));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<LoanTerm>("24").is_ok());
        assert!(serde_json::from_str::<LoanTerm>("48").is_err());
    }
}
