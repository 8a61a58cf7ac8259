//! Estate Desk Core - Shared types library.
//!
//! This crate provides the domain types used across all Estate Desk components:
//! - `api` - JSON HTTP API for applications, agencies, solicitors and estates
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. With the `postgres` feature enabled the newtypes also
//! implement the `sqlx` encode/decode traits so they can be bound directly.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, loan amounts and terms, statuses, line-item
//!   categories and field-level validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
