//! Core types for Estate Desk.
//!
//! This module provides type-safe wrappers for the loan back-office domain.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod term;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{DecimalError, LineItemValue, LoanAmount};
pub use status::*;
pub use term::{LoanTerm, TermError};
pub use validation::FieldErrors;
