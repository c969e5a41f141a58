//! secrets::traits
//!
//! The storage seam under [`CredentialStore`](crate::auth::CredentialStore).
//!
//! A backend maps keys to opaque strings. The session core keeps its whole
//! credential record under one key, so one `set` replaces every field and a
//! reader never sees half a record.
//!
//! Backends never put stored values into errors or logs.

use thiserror::Error;

/// Backend failure. Messages name where the secret lives, never its value.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot read {location}: {reason}")]
    Read { location: String, reason: String },

    #[error("cannot write {location}: {reason}")]
    Write { location: String, reason: String },

    #[error("secret provider '{provider}' is not available: {reason}")]
    Unavailable { provider: String, reason: String },
}

impl SecretError {
    pub fn read(location: impl Into<String>, reason: impl ToString) -> Self {
        SecretError::Read {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(location: impl Into<String>, reason: impl ToString) -> Self {
        SecretError::Write {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        SecretError::Unavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

/// Blocking key-value backend for secrets.
///
/// Callers on an async runtime run these methods on a blocking thread.
pub trait SecretStore: Send + Sync {
    /// Stored value for `key`, or `None`.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Where the secrets live, for logs and error messages.
    fn location(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_location_and_reason() {
        let err = SecretError::write("/home/u/.foodcare/secrets.toml", "disk full");
        assert_eq!(
            err.to_string(),
            "cannot write /home/u/.foodcare/secrets.toml: disk full"
        );

        let err = SecretError::unavailable("keychain", "not compiled in");
        assert!(err.to_string().contains("'keychain'"));
    }
}
