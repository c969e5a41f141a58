//! transport::client
//!
//! ApiClient: the authenticated request pipeline.
//!
//! Every request goes through the same steps:
//!
//! 1. Refresh ahead of time if the access token is about to expire
//! 2. Sign with the current access token
//! 3. Send, bounded by the request timeout
//! 4. On 401, hand the request to the refresher and retry what it returns
//!
//! The refresher caps the retries, so step 4 runs at most once per request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::request::{ApiRequest, FailedResponse};
use crate::auth::{status_message, AuthError, AuthRequestSigner, TokenRefresher, MAX_RESPONSE_CHAIN};

/// Authenticated HTTP client.
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    signer: AuthRequestSigner,
    refresher: Arc<TokenRefresher>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        signer: AuthRequestSigner,
        refresher: Arc<TokenRefresher>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            timeout,
            signer,
            refresher,
        })
    }

    /// Send `request` through the pipeline.
    ///
    /// Returns the response for any status other than a final 401. A final
    /// 401 is [`AuthError::AuthExhausted`] when the request had already been
    /// retried after a refresh, and [`AuthError::NotAuthenticated`] when the
    /// session is gone.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, AuthError> {
        self.refresher.refresh_if_expiring().await?;

        let mut signed = self.signer.sign(request);
        let mut failure: Option<FailedResponse> = None;

        loop {
            let response = self.send(&signed).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let failed = match failure.take() {
                Some(prior) => prior.followed_by(StatusCode::UNAUTHORIZED),
                None => FailedResponse::new(StatusCode::UNAUTHORIZED, signed.path()),
            };
            debug!(path = %signed.path(), chain = failed.chain_len(), "request rejected with 401");

            match self.refresher.handle_auth_failure(&signed, &failed).await {
                Some(retry) => {
                    signed = retry;
                    failure = Some(failed);
                }
                None if failed.chain_len() >= MAX_RESPONSE_CHAIN => {
                    return Err(AuthError::AuthExhausted)
                }
                None => return Err(AuthError::NotAuthenticated),
            }
        }
    }

    /// Send and decode a JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AuthError> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| AuthError::Protocol(format!("cannot parse response: {}", e)))
    }

    /// Send and discard the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), AuthError> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn send(&self, request: &ApiRequest) -> Result<Response, AuthError> {
        let url = request.url(&self.base_url)?;
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(method = %request.method(), path = %request.path(), "sending request");
        Ok(tokio::time::timeout(self.timeout, builder.send()).await??)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Error body shapes the server uses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            _ => self.message,
        }
        .filter(|m| !m.trim().is_empty())
    }
}

/// Convert a non-2xx response into [`AuthError::Http`].
///
/// Uses the body's `detail` or `message` when present, otherwise the
/// standard message for the status.
pub(crate) async fn error_from_response(response: Response) -> AuthError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| status_message(status).to_string());
    AuthError::Http { status, message }
}
