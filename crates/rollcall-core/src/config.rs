//! Application configuration management.
//!
//! The configuration names the events service origin, the role treated as
//! privileged, and where the credential is kept. It is stored at
//! `~/.config/rollcall/config.json`; the `ROLLCALL_API_URL` environment
//! variable overrides the stored origin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_PRIVILEGED_ROLE;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "rollcall";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides `base_url`
pub const API_URL_ENV: &str = "ROLLCALL_API_URL";

/// Path of the events collection below the service origin
pub const EVENTS_PATH: &str = "/api/Events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    Keyring,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub privileged_role: Option<String>,
    #[serde(default)]
    pub credential_store: CredentialBackend,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Service origin, preferring the environment over the config file.
    pub fn base_url(&self) -> Result<String> {
        self.resolve_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_base_url(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .map(|url| url.trim().to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No events service configured; set {} or base_url in the config file",
                    API_URL_ENV
                )
            })
    }

    pub fn privileged_role(&self) -> &str {
        self.privileged_role
            .as_deref()
            .unwrap_or(DEFAULT_PRIVILEGED_ROLE)
    }
}

/// Join a service origin with the events collection path.
pub fn events_base(origin: &str) -> String {
    let origin = origin.trim().trim_end_matches('/');
    if origin.ends_with(EVENTS_PATH) {
        origin.to_string()
    } else {
        format!("{}{}", origin, EVENTS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_base() {
        assert_eq!(events_base("https://host"), "https://host/api/Events");
        assert_eq!(events_base("https://host/"), "https://host/api/Events");
        assert_eq!(events_base("https://host/api/Events/"), "https://host/api/Events");
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config {
            base_url: Some("https://file".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_base_url(Some("https://env".to_string())).unwrap(),
            "https://env"
        );
        assert_eq!(config.resolve_base_url(Some("  ".to_string())).unwrap(), "https://file");
        assert_eq!(config.resolve_base_url(None).unwrap(), "https://file");
        assert!(Config::default().resolve_base_url(None).is_err());
    }

    #[test]
    fn test_parse_config_file() {
        let config: Config = serde_json::from_str(
            r#"{"base_url": "https://x", "privileged_role": "Organizer", "credential_store": "file"}"#,
        )
        .unwrap();
        assert_eq!(config.credential_store, CredentialBackend::File);
        assert_eq!(config.privileged_role(), "Organizer");

        let defaults: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.credential_store, CredentialBackend::Keyring);
        assert_eq!(defaults.privileged_role(), "admin");
    }
}
