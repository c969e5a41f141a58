//! secrets::file_store
//!
//! File-based secret storage at `~/.foodcare/secrets.toml`.
//!
//! - Permissions are 0600 on Unix, applied before any content is written
//! - Every write goes to a sibling temp file, is synced, then renamed over
//!   the original, so a reader sees either the old or the new document
//! - Values never appear in error messages

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

type SecretMap = BTreeMap<String, String>;

/// File-based secret storage (the default provider).
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at the default location, `~/.foodcare/secrets.toml`.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::unavailable("file", "cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".foodcare").join("secrets.toml")))
    }

    /// Store backed by `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SecretMap, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SecretMap::new()),
            Err(e) => return Err(SecretError::read(self.location(), e)),
        };
        toml::from_str(&content).map_err(|e| SecretError::read(self.location(), e.message()))
    }

    fn save(&self, secrets: &SecretMap) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }
        let content = toml::to_string_pretty(secrets).map_err(|e| self.write_error(e))?;

        let temp_path = self.path.with_extension("toml.tmp");
        let mut temp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| self.write_error(e))?;
        #[cfg(unix)]
        temp.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| self.write_error(e))?;
        temp.write_all(content.as_bytes()).map_err(|e| self.write_error(e))?;
        temp.sync_all().map_err(|e| self.write_error(e))?;
        drop(temp);

        fs::rename(&temp_path, &self.path).map_err(|e| self.write_error(e))
    }

    fn write_error(&self, reason: impl ToString) -> SecretError {
        SecretError::write(self.location(), reason)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        match secrets.remove(key) {
            Some(_) => self.save(&secrets),
            None => Ok(()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
