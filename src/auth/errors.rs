//! auth::errors
//!
//! Error taxonomy for the session core.
//!
//! # Design
//!
//! Every login, register, refresh and signed request resolves to either a
//! value or one of these errors. Messages never contain token values.
//!
//! # Example
//!
//! ```
//! use foodcare_session::auth::{AuthError, ErrorKind};
//!
//! let err = AuthError::Http { status: 409, message: "user exists".into() };
//! assert_eq!(err.kind(), ErrorKind::Http(409));
//! assert_eq!(err.user_message(), "An account with this login already exists.");
//! ```

use thiserror::Error;

use crate::secrets::SecretError;

/// Local persistence failure while writing or clearing credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The secret backend rejected the operation.
    #[error("credential storage failed: {0}")]
    Backend(#[from] SecretError),

    /// The credential record could not be encoded.
    #[error("cannot encode credential record: {0}")]
    Encode(String),

    /// The blocking storage task did not complete.
    #[error("credential storage task failed: {0}")]
    Task(String),
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad local input; no I/O was attempted.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The server answered with success but the payload broke the
    /// required-fields contract.
    #[error("unexpected server response: {0}")]
    Protocol(String),

    /// Connect, DNS or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-2xx response.
    #[error("server returned {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message from the response body, or the status text
        message: String,
    },

    /// Local credential persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The refresh loop guard tripped for this request.
    #[error("authentication failed after refreshing credentials")]
    AuthExhausted,

    /// No credentials are stored.
    #[error("not logged in")]
    NotAuthenticated,

    /// A newer call of the same operation replaced this one; its result
    /// was discarded.
    #[error("superseded by a newer request")]
    Superseded,
}

/// Cheap, copyable classification of an [`AuthError`].
///
/// Published through `SessionState::last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Protocol,
    Network,
    Timeout,
    Http(u16),
    Storage,
    AuthExhausted,
    NotAuthenticated,
    Superseded,
}

impl AuthError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Protocol(_) => ErrorKind::Protocol,
            AuthError::Network(_) => ErrorKind::Network,
            AuthError::Timeout => ErrorKind::Timeout,
            AuthError::Http { status, .. } => ErrorKind::Http(*status),
            AuthError::Storage(_) => ErrorKind::Storage,
            AuthError::AuthExhausted => ErrorKind::AuthExhausted,
            AuthError::NotAuthenticated => ErrorKind::NotAuthenticated,
            AuthError::Superseded => ErrorKind::Superseded,
        }
    }

    /// Whether the user may reasonably retry the same operation.
    ///
    /// Nothing is retried automatically; this only drives what the caller
    /// offers the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Network(_) | AuthError::Timeout => true,
            AuthError::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Whether the session is gone and the user has to log in again.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            AuthError::AuthExhausted
                | AuthError::NotAuthenticated
                | AuthError::Http { status: 401, .. }
        )
    }

    /// Human-readable message for display.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Protocol(_) => "The server sent an incomplete response.".to_string(),
            AuthError::Network(_) => {
                "Cannot reach the server. Check your connection and try again.".to_string()
            }
            AuthError::Timeout => "The server took too long to respond. Try again.".to_string(),
            AuthError::Http { status, .. } => status_message(*status).to_string(),
            AuthError::Storage(_) => "Could not save your session on this device.".to_string(),
            AuthError::AuthExhausted | AuthError::NotAuthenticated => {
                "Your session has ended. Please log in again.".to_string()
            }
            AuthError::Superseded => "Replaced by a newer request.".to_string(),
        }
    }
}

/// Message shown for a non-2xx status.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "The server rejected the submitted data.",
        401 => "Wrong login or password.",
        403 => "Access denied.",
        404 => "Not found.",
        409 => "An account with this login already exists.",
        500..=599 => "Server error. Try again later.",
        _ => "Unexpected server response.",
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else if err.is_decode() {
            AuthError::Protocol(err.to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for AuthError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AuthError::Timeout
    }
}

impl From<SecretError> for AuthError {
    fn from(err: SecretError) -> Self {
        AuthError::Storage(StorageError::Backend(err))
    }
}
