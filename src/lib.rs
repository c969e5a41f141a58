//! foodcare-session - authenticated session core for the FoodCare client
//!
//! Signs the user in against the FoodCare API, keeps the resulting
//! access/refresh token pair in a secret store, signs every request with it
//! and refreshes it transparently when the server rejects it.
//!
//! # Architecture
//!
//! - [`auth`] - Credential store, request signer, token refresher and session controller
//! - [`api`] - Remote auth API and the product endpoints
//! - [`transport`] - HTTP pipeline: sign, send, refresh on 401, retry once
//! - [`secrets`] - Secret storage abstraction
//! - [`config`] - TOML configuration
//! - [`cli`] - Command-line interface (the `foodcare` binary)
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! 1. At most one refresh request is in flight at a time
//! 2. A request is retried at most once after a refresh
//! 3. A login or logout started later always wins over one started earlier
//! 4. Tokens never appear in logs, errors or `Debug` output

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod secrets;
pub mod transport;
pub mod ui;
