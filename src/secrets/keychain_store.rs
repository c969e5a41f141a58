//! secrets::keychain_store
//!
//! OS keychain backend (`keyring` crate). The store type exists only with
//! the `keychain` feature; without it the `keychain` provider reports itself
//! unavailable.

use std::sync::Arc;

use super::traits::{SecretError, SecretStore};

/// Keychain service name for FoodCare entries.
pub const KEYCHAIN_SERVICE: &str = "foodcare";

/// Open the keychain provider.
#[cfg(feature = "keychain")]
pub(super) fn open() -> Result<Arc<dyn SecretStore>, SecretError> {
    Ok(Arc::new(KeychainSecretStore::new()))
}

/// Open the keychain provider.
#[cfg(not(feature = "keychain"))]
pub(super) fn open() -> Result<Arc<dyn SecretStore>, SecretError> {
    Err(SecretError::unavailable(
        "keychain",
        "not enabled in this build (compile with --features keychain)",
    ))
}

/// Secrets kept in the platform keychain, one entry per key.
#[cfg(feature = "keychain")]
#[derive(Debug)]
pub struct KeychainSecretStore {
    service: String,
}

#[cfg(feature = "keychain")]
impl KeychainSecretStore {
    /// Store under the `foodcare` service.
    pub fn new() -> Self {
        Self::with_service(KEYCHAIN_SERVICE)
    }

    /// Store under another service name, keeping tests away from real entries.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(&self.service, key).map_err(|e| SecretError::read(self.location(), e))
    }
}

#[cfg(feature = "keychain")]
impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keychain")]
impl SecretStore for KeychainSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::read(self.location(), e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SecretError::write(self.location(), e))
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::write(self.location(), e)),
        }
    }

    fn location(&self) -> String {
        format!("keychain service '{}'", self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "keychain"))]
    #[test]
    fn unavailable_without_feature() {
        let err = open().err().expect("keychain should be unavailable");
        assert!(matches!(err, SecretError::Unavailable { .. }));
        assert!(err.to_string().contains("--features keychain"));
    }

    #[cfg(feature = "keychain")]
    #[test]
    fn location_names_service() {
        let store = KeychainSecretStore::with_service("foodcare-test");
        assert_eq!(store.location(), "keychain service 'foodcare-test'");
    }
}
