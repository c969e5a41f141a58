//! auth::refresher
//!
//! TokenRefresher: single-flight token refresh on authentication failure.
//!
//! # Concurrency
//!
//! A burst of 401s must produce one refresh call, and every caller must get
//! the same outcome. The pattern is the same one used for refreshing ahead
//! of expiry:
//!
//! 1. Acquire the refresh lock
//! 2. Re-read the credentials (another caller may have refreshed already)
//! 3. Refresh only if the stored access token is still the one that failed
//! 4. Update or clear the store before releasing the lock
//!
//! Callers queued on the lock see the store as the first caller left it: a
//! new access token (they retry with it) or no credentials (they give up).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::credentials::TokenPair;
use super::errors::AuthError;
use super::signer::AuthRequestSigner;
use super::store::CredentialStore;
use crate::api::AuthApi;
use crate::transport::{ApiRequest, FailedResponse};

/// Longest failure chain a request may reach before retries stop.
///
/// With a bound of 2 a request gets one refresh cycle: the first 401 leads
/// to a refresh and a retry, a 401 on the retry is final.
pub const MAX_RESPONSE_CHAIN: usize = 2;

/// Coordinates token refreshes for one session.
pub struct TokenRefresher {
    store: Arc<CredentialStore>,
    api: Arc<dyn AuthApi>,
    signer: AuthRequestSigner,
    refresh_path: String,
    timeout: Duration,
    lock: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(
        store: Arc<CredentialStore>,
        api: Arc<dyn AuthApi>,
        refresh_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            signer: AuthRequestSigner::new(Arc::clone(&store)),
            store,
            api,
            refresh_path: refresh_path.into(),
            timeout,
            lock: Mutex::new(()),
        }
    }

    /// Whether `path` is the refresh endpoint.
    pub fn is_refresh_path(&self, path: &str) -> bool {
        trim_path(path) == trim_path(&self.refresh_path)
    }

    /// Decide what to do after `request` was rejected with `response`.
    ///
    /// Returns the request to retry, signed with a fresh access token, or
    /// `None` when the failure is final. Concurrent callers share a single
    /// refresh call and its outcome.
    pub async fn handle_auth_failure(
        &self,
        request: &ApiRequest,
        response: &FailedResponse,
    ) -> Option<ApiRequest> {
        if self.is_refresh_path(request.path()) {
            warn!("refresh endpoint rejected the session, logging out");
            self.end_session().await;
            return None;
        }

        if response.chain_len() >= MAX_RESPONSE_CHAIN {
            warn!(
                path = %request.path(),
                chain = response.chain_len(),
                "request still rejected after refresh, giving up"
            );
            return None;
        }

        let _refreshing = self.lock.lock().await;

        let tokens = match self.store.read().tokens {
            Some(tokens) => tokens,
            None => {
                debug!("no credentials after waiting for refresh");
                return None;
            }
        };

        if request.bearer_token() != Some(tokens.access_token.as_str()) {
            debug!("credentials changed since the request was signed, retrying");
            return Some(self.signer.sign(request.clone()));
        }

        match self.refresh(&tokens).await {
            Ok(true) => Some(self.signer.sign(request.clone())),
            Ok(false) => None,
            Err(e) => {
                warn!(error = %e, "token refresh failed, logging out");
                self.end_session().await;
                None
            }
        }
    }

    /// Refresh ahead of time when the access token is about to expire.
    ///
    /// A transient failure (network, timeout, 5xx) leaves the session as is,
    /// since the current token may still be accepted. Any other failure ends
    /// the session and returns [`AuthError::NotAuthenticated`].
    pub async fn refresh_if_expiring(&self) -> Result<(), AuthError> {
        if !self.expiring() {
            return Ok(());
        }

        let _refreshing = self.lock.lock().await;

        let tokens = match self.store.read().tokens {
            Some(tokens) if tokens.needs_refresh() => tokens,
            _ => return Ok(()),
        };

        debug!("access token about to expire, refreshing");
        match self.refresh(&tokens).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "early refresh failed, keeping current token");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "early refresh rejected, logging out");
                self.end_session().await;
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    fn expiring(&self) -> bool {
        self.store
            .read()
            .tokens
            .map(|t| t.needs_refresh())
            .unwrap_or(false)
    }

    /// Exchange `current.refresh_token` and store the new pair.
    ///
    /// Must be called with the refresh lock held. Returns `Ok(false)` when
    /// the store changed during the call and the new pair was dropped.
    async fn refresh(&self, current: &TokenPair) -> Result<bool, AuthError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.api.refresh(&current.refresh_token),
        )
        .await??;
        let tokens = response.into_token_pair()?;

        let replaced = self
            .store
            .replace_tokens(&current.refresh_token, tokens)
            .await?;
        if replaced {
            info!("access token refreshed");
        } else {
            debug!("session changed during refresh, new tokens dropped");
        }
        Ok(replaced)
    }

    async fn end_session(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "cannot remove stored credentials");
        }
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("refresh_path", &self.refresh_path)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn trim_path(path: &str) -> &str {
    path.trim_matches('/')
}
