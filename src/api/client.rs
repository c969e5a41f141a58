//! api::client
//!
//! reqwest implementation of [`AuthApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::models::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse, UserRecord,
};
use super::AuthApi;
use crate::auth::AuthError;
use crate::transport::{error_from_response, ApiRequest};

/// Default path of the refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/refresh";

/// HTTP client for the auth endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
    refresh_path: String,
}

impl HttpAuthApi {
    /// Create a client for the API at `base_url`.
    ///
    /// `timeout` bounds every call, connect included.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        })
    }

    /// Use a different refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let url = ApiRequest::post(path).url(&self.base_url)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| AuthError::Protocol(format!("cannot parse response: {}", e)))
    } else {
        Err(error_from_response(response).await)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, AuthError> {
        self.post("/register", request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, AuthError> {
        self.post("/login", request).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post(&self.refresh_path, &body).await
    }

    async fn fetch_user(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<UserRecord, AuthError> {
        let mut url = ApiRequest::get("/get_user_by_id").url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AuthError::Validation(format!("base URL '{}' cannot take a path", self.base_url)))?
            .push(user_id);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| AuthError::Protocol("access token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let records: Vec<UserRecord> = handle_response(response).await?;
        records.into_iter().next().ok_or_else(|| AuthError::Http {
            status: 404,
            message: format!("no user with id {}", user_id),
        })
    }
}
