//! auth - authenticated session core
//!
//! Keeps the user's access/refresh token pair, signs outgoing requests with
//! it, refreshes it when the server rejects it, and exposes the resulting
//! session state.
//!
//! # Components
//!
//! - [`CredentialStore`] - Durable, observable owner of [`Credentials`]
//! - [`AuthRequestSigner`] - Attaches the access token to requests
//! - [`TokenRefresher`] - Single-flight refresh on 401
//! - [`SessionController`] - Login, registration, logout and [`SessionState`]
//!
//! Only [`SessionController`] (whole record) and [`TokenRefresher`] (token
//! pair) write to the store. Both go through the store's write lock.
//!
//! # Security
//!
//! Tokens never appear in logs, error messages or `Debug` output. Types
//! holding tokens implement `Debug` by hand and print `[REDACTED]`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use foodcare_session::api::{AuthApi, HttpAuthApi};
//! use foodcare_session::auth::{CredentialStore, SessionController, SessionOptions};
//!
//! # async fn demo() -> Result<(), foodcare_session::auth::AuthError> {
//! let store = Arc::new(CredentialStore::in_memory());
//! let api: Arc<dyn AuthApi> =
//!     Arc::new(HttpAuthApi::new("http://localhost:8000", Duration::from_secs(30))?);
//! let session = SessionController::new(store, api, SessionOptions::default());
//!
//! session.login("alice", "secret1").await?;
//! assert!(session.state().is_authenticated);
//! # Ok(())
//! # }
//! ```

mod credentials;
mod errors;
mod refresher;
mod session;
mod signer;
mod store;
mod validation;

pub use credentials::{
    Credentials, RecordError, StoredCredentials, TokenPair, UserProfile, CREDENTIALS_KIND,
    CREDENTIALS_SECRET_KEY, CREDENTIALS_VERSION, EXPIRY_BUFFER_SECS,
};
pub use errors::{status_message, AuthError, ErrorKind, StorageError};
pub use refresher::{TokenRefresher, MAX_RESPONSE_CHAIN};
pub use session::{
    OperationStatus, PendingOperation, SessionController, SessionOptions, SessionState,
    SessionWatcher, DEFAULT_REQUEST_TIMEOUT,
};
pub use signer::AuthRequestSigner;
pub use store::CredentialStore;
pub use validation::{ValidationPolicy, DEFAULT_MIN_PASSWORD_LENGTH};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_is_stable() {
        assert_eq!(CREDENTIALS_KIND, "foodcare.session");
        assert_eq!(CREDENTIALS_VERSION, 1);
    }

    #[test]
    fn expiry_buffer_is_five_minutes() {
        assert_eq!(EXPIRY_BUFFER_SECS, 300);
    }

    #[test]
    fn one_refresh_cycle_per_request() {
        assert_eq!(MAX_RESPONSE_CHAIN, 2);
    }
}
