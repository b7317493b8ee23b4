use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE_NAME: &str = "rollcall";

/// Fixed key the token is stored under.
pub const CREDENTIAL_KEY: &str = "jwt";

/// Credential file name in cache directory
const CREDENTIAL_FILE: &str = "credential.json";

/// Read side of credential storage.
pub trait CredentialProvider: Send + Sync {
    /// The stored token, if any. Storage errors read as "no credential".
    fn get_credential(&self) -> Option<String>;
}

/// Storage that can also be written, used after a login and on logout.
pub trait CredentialStore: CredentialProvider {
    fn store(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn get_credential(&self) -> Option<String> {
        (**self).get_credential()
    }
}

/// Token kept in the OS keychain.
pub struct KeyringCredentials;

impl KeyringCredentials {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, CREDENTIAL_KEY).context("Failed to create keyring entry")
    }
}

impl CredentialProvider for KeyringCredentials {
    fn get_credential(&self) -> Option<String> {
        let entry = Self::entry().ok()?;
        match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(error = %e, "Failed to read credential from keychain");
                None
            }
        }
    }
}

impl CredentialStore for KeyringCredentials {
    fn store(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(rename = "jwt")]
    token: String,
    stored_at: DateTime<Utc>,
}

/// Token kept as JSON in the cache directory, for hosts without a keychain.
pub struct FileCredentials {
    cache_dir: PathBuf,
}

impl FileCredentials {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(CREDENTIAL_FILE)
    }

    fn load(path: &Path) -> Result<Option<StoredCredential>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read credential file")?;
        let stored = serde_json::from_str(&contents).context("Failed to parse credential file")?;
        Ok(Some(stored))
    }
}

impl CredentialProvider for FileCredentials {
    fn get_credential(&self) -> Option<String> {
        match Self::load(&self.path()) {
            Ok(stored) => stored.map(|s| s.token),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable credential file");
                None
            }
        }
    }
}

impl CredentialStore for FileCredentials {
    fn store(&self, token: &str) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredCredential {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&path, contents).context("Failed to write credential file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory token, for embedding and tests.
#[derive(Default)]
pub struct StaticCredential {
    token: RwLock<Option<String>>,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredential {
    fn get_credential(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }
}

impl CredentialStore for StaticCredential {
    fn store(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Credential lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Credential lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_credentials_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let creds = FileCredentials::new(dir.path().join("nested"));
        assert_eq!(creds.get_credential(), None);

        creds.store("a.b.c").unwrap();
        assert_eq!(creds.get_credential().as_deref(), Some("a.b.c"));

        let raw = std::fs::read_to_string(creds.path()).unwrap();
        assert!(raw.contains("\"jwt\""));

        creds.clear().unwrap();
        assert_eq!(creds.get_credential(), None);
        // Clearing twice is fine
        creds.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let creds = FileCredentials::new(dir.path().to_path_buf());
        std::fs::write(creds.path(), "{not json").unwrap();
        assert_eq!(creds.get_credential(), None);
    }

    #[test]
    fn test_static_credential() {
        let creds = StaticCredential::empty();
        assert_eq!(creds.get_credential(), None);
        creds.store("x.y.z").unwrap();
        assert_eq!(creds.get_credential().as_deref(), Some("x.y.z"));
        creds.clear().unwrap();
        assert_eq!(creds.get_credential(), None);
    }
}
