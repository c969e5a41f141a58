//! transport
//!
//! HTTP plumbing for authenticated requests.
//!
//! # Modules
//!
//! - [`request`] - [`ApiRequest`] and the [`FailedResponse`] chain
//! - [`client`] - [`ApiClient`], the sign / send / refresh-and-retry pipeline

pub mod client;
pub mod request;

pub use client::ApiClient;
pub(crate) use client::error_from_response;
pub use request::{ApiRequest, FailedResponse};
