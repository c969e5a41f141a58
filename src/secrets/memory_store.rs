//! secrets::memory_store
//!
//! Process-local secret storage. Nothing survives a restart; used for the
//! `memory` provider and as the backing of `CredentialStore::in_memory`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::traits::{SecretError, SecretStore};

const LOCATION: &str = "process memory";

/// In-memory secret storage.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, SecretError> {
        self.data
            .lock()
            .map_err(|_| SecretError::read(LOCATION, "lock poisoned"))
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store = MemorySecretStore::new();
        assert!(store.get("foodcare.session").expect("get").is_none());

        store.set("foodcare.session", "v1").expect("set");
        store.set("foodcare.session", "v2").expect("overwrite");
        assert_eq!(store.get("foodcare.session").expect("get"), Some("v2".to_string()));

        store.delete("foodcare.session").expect("delete");
        store.delete("foodcare.session").expect("delete missing");
        assert!(store.get("foodcare.session").expect("get").is_none());
    }
}
