//! auth::signer
//!
//! Attaches the current access token to outgoing requests.

use std::sync::Arc;

use super::store::CredentialStore;
use crate::transport::ApiRequest;

/// Signs requests with the access token held by a [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct AuthRequestSigner {
    store: Arc<CredentialStore>,
}

impl AuthRequestSigner {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Return `request` with `Authorization: Bearer <access token>`.
    ///
    /// Without a stored token the request is returned unchanged.
    pub fn sign(&self, request: ApiRequest) -> ApiRequest {
        match self.store.read().access_token() {
            Some(token) => request.with_bearer(token),
            None => request,
        }
    }
}
