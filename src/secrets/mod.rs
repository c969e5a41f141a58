//! secrets
//!
//! Durable key-value storage for the session record.
//!
//! Providers:
//! - `file`: [`FileSecretStore`], `~/.foodcare/secrets.toml` (default)
//! - `keychain`: `KeychainSecretStore`, the OS keychain (feature `keychain`)
//! - `memory`: [`MemorySecretStore`], nothing persisted
//!
//! Secrets are never logged or included in error messages.

mod file_store;
mod keychain_store;
mod memory_store;
mod traits;

use std::sync::Arc;

pub use file_store::FileSecretStore;
#[cfg(feature = "keychain")]
pub use keychain_store::KeychainSecretStore;
pub use keychain_store::KEYCHAIN_SERVICE;
pub use memory_store::MemorySecretStore;
pub use traits::{SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Provider names accepted by [`create_store`] and the config file.
pub const VALID_PROVIDERS: &[&str] = &["file", "keychain", "memory"];

/// Open the provider named `provider`.
///
/// # Errors
///
/// [`SecretError::Unavailable`] for unknown names, and for `"keychain"`
/// in builds without the `keychain` feature.
pub fn create_store(provider: &str) -> Result<Arc<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Arc::new(FileSecretStore::new()?)),
        "memory" => Ok(Arc::new(MemorySecretStore::new())),
        "keychain" => keychain_store::open(),
        other => Err(SecretError::unavailable(
            other,
            format!("unknown provider (valid: {})", VALID_PROVIDERS.join(", ")),
        )),
    }
}
