//! api
//!
//! Remote FoodCare API.
//!
//! # Modules
//!
//! - [`models`] - Wire types for the auth endpoints
//! - [`client`] - [`HttpAuthApi`], the reqwest implementation of [`AuthApi`]
//! - [`products`] - Product endpoints riding on the authenticated pipeline
//!
//! # Design
//!
//! The auth endpoints sit behind the [`AuthApi`] trait so the session core
//! can be driven by an in-process fake in tests. They are called without the
//! signer or the refresher: login and register carry no token, and a refresh
//! that went through the refresher could recurse into itself.

pub mod client;
pub mod models;
pub mod products;

use async_trait::async_trait;

use crate::auth::AuthError;

pub use client::HttpAuthApi;
pub use models::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse, UserRecord,
};
pub use products::{ProductsApi, UserProduct};

/// The unauthenticated auth endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /register`. Creates the account; does not log in.
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, AuthError>;

    /// `POST /login`.
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, AuthError>;

    /// `POST /refresh`. Exchanges a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    /// `GET /get_user_by_id/{user_id}` with an explicit access token.
    async fn fetch_user(&self, user_id: &str, access_token: &str)
        -> Result<UserRecord, AuthError>;
}
