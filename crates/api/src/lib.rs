//! Estate Desk API library.
//!
//! A JSON back office for probate loans: accounts and tokens, estate
//! agencies and their solicitors, loan applications and the estates
//! securing them. Exposed as a library so the CLI and the integration
//! tests can reuse the repositories, services and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
