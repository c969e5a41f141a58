//! auth::store
//!
//! CredentialStore: the single owner of the credential record.
//!
//! # Design
//!
//! The current record lives in a `tokio::sync::watch` channel. Reads borrow
//! the latest value without waiting on writers, and every subscriber gets the
//! latest value on subscribe plus each later one.
//!
//! Writes are serialized by one async mutex. A write persists to the secret
//! backend first and only then publishes the new snapshot, so observers see
//! writes in the order they were committed and never see a record that
//! failed to persist.
//!
//! Backend I/O is blocking (files, keychain) and runs on
//! `tokio::task::spawn_blocking`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::credentials::{
    Credentials, RecordError, StoredCredentials, TokenPair, CREDENTIALS_SECRET_KEY,
};
use super::errors::StorageError;
use crate::secrets::{MemorySecretStore, SecretStore};

/// Durable, observable store for [`Credentials`].
pub struct CredentialStore {
    backend: Arc<dyn SecretStore>,
    write_lock: Mutex<()>,
    current: watch::Sender<Credentials>,
}

impl CredentialStore {
    /// Open a store over `backend`, loading any persisted record.
    ///
    /// A record that cannot be read or parsed is logged and ignored. A record
    /// holding only one of the two tokens is deleted from the backend.
    pub fn open(backend: Arc<dyn SecretStore>) -> Self {
        let initial = load(backend.as_ref());
        let (current, _) = watch::channel(initial);
        Self {
            backend,
            write_lock: Mutex::new(()),
            current,
        }
    }

    /// Store that keeps nothing beyond the process.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemorySecretStore::new()))
    }

    /// Snapshot of the current record.
    pub fn read(&self) -> Credentials {
        self.current.borrow().clone()
    }

    /// Subscribe to record changes.
    ///
    /// The receiver starts with the current record marked as seen; call
    /// `borrow()` for it and `changed().await` for the next one.
    pub fn observe(&self) -> watch::Receiver<Credentials> {
        self.current.subscribe()
    }

    /// Replace the whole record.
    pub async fn write(&self, credentials: Credentials) -> Result<(), StorageError> {
        self.write_if(credentials, |_| true).await.map(|_| ())
    }

    /// Replace the whole record if `guard` accepts the current one.
    ///
    /// `guard` runs while the write lock is held, so no other write can land
    /// between the check and the commit. Returns whether the write happened.
    pub async fn write_if<F>(&self, credentials: Credentials, guard: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&Credentials) -> bool,
    {
        let _lock = self.write_lock.lock().await;

        if !guard(&self.read()) {
            debug!("credential write rejected by guard");
            return Ok(false);
        }

        self.persist(&credentials).await?;
        self.publish(credentials);
        Ok(true)
    }

    /// Replace the record without persisting it.
    ///
    /// Used when the backend is unavailable and memory-only sessions are
    /// allowed. The persisted record is left as it was.
    pub async fn write_in_memory(&self, credentials: Credentials) {
        self.write_in_memory_if(credentials, |_| true).await;
    }

    /// [`write_in_memory`](Self::write_in_memory) behind a guard, with the
    /// same semantics as [`write_if`](Self::write_if).
    pub async fn write_in_memory_if<F>(&self, credentials: Credentials, guard: F) -> bool
    where
        F: FnOnce(&Credentials) -> bool,
    {
        let _lock = self.write_lock.lock().await;
        if !guard(&self.read()) {
            return false;
        }
        warn!("credentials held in memory only, they will not survive a restart");
        self.publish(credentials);
        true
    }

    /// Swap the token pair, keeping the user identity.
    ///
    /// Applied only while the stored refresh token is still
    /// `expected_refresh_token`. Returns `false` without writing when the
    /// record changed underneath (logout, or a new login).
    pub async fn replace_tokens(
        &self,
        expected_refresh_token: &str,
        tokens: TokenPair,
    ) -> Result<bool, StorageError> {
        let _lock = self.write_lock.lock().await;

        let current = self.read();
        if current.refresh_token() != Some(expected_refresh_token) {
            debug!("token replacement skipped, stored refresh token changed");
            return Ok(false);
        }

        let next = current.with_tokens(tokens);
        self.persist(&next).await?;
        self.publish(next);
        Ok(true)
    }

    /// Wipe the record.
    ///
    /// The in-memory record is always wiped and observers notified, even
    /// when the backend delete fails; that failure is returned afterwards.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _lock = self.write_lock.lock().await;

        let result = self.persist(&Credentials::default()).await;
        self.publish(Credentials::default());
        debug!("credentials cleared");

        if let Err(ref e) = result {
            warn!(error = %e, "credentials cleared in memory but not in storage");
        }
        result
    }

    async fn persist(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let backend = Arc::clone(&self.backend);

        if credentials.is_empty() {
            return tokio::task::spawn_blocking(move || backend.delete(CREDENTIALS_SECRET_KEY))
                .await
                .map_err(|e| StorageError::Task(e.to_string()))?
                .map_err(StorageError::from);
        }

        let json = StoredCredentials::from_credentials(credentials)
            .to_json()
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        tokio::task::spawn_blocking(move || backend.set(CREDENTIALS_SECRET_KEY, &json))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
            .map_err(StorageError::from)
    }

    fn publish(&self, credentials: Credentials) {
        let authenticated = credentials.is_authenticated();
        self.current.send_replace(credentials);
        debug!(authenticated, "credentials published");
    }
}

fn load(backend: &dyn SecretStore) -> Credentials {
    let location = backend.location();
    let json = match backend.get(CREDENTIALS_SECRET_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return Credentials::default(),
        Err(e) => {
            warn!(%location, error = %e, "cannot read stored credentials, starting logged out");
            return Credentials::default();
        }
    };

    match StoredCredentials::parse(&json).and_then(StoredCredentials::into_credentials) {
        Ok(credentials) => {
            debug!(
                %location,
                authenticated = credentials.is_authenticated(),
                "loaded stored credentials"
            );
            credentials
        }
        Err(RecordError::PartialTokens) => {
            warn!(%location, "stored credentials hold only one token, clearing them");
            if let Err(e) = backend.delete(CREDENTIALS_SECRET_KEY) {
                warn!(error = %e, "cannot delete partial credential record");
            }
            Credentials::default()
        }
        Err(e) => {
            warn!(%location, error = %e, "ignoring corrupt credential record");
            Credentials::default()
        }
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("current", &*self.current.borrow())
            .finish_non_exhaustive()
    }
}
