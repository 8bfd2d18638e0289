//! Application configuration management.
//!
//! This module loads the optional configuration file, which can override the
//! default identity endpoint, user domain and the locations of the credential
//! file and session cache.
//!
//! Configuration is stored at `~/.config/neologin/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "neologin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Credential file name, placed in the user's home directory
const CREDENTIAL_FILE: &str = ".neo.env";

/// Session cache file name, placed in the system temp directory
const SESSION_FILE: &str = "neologin-session.json";

pub const DEFAULT_AUTH_URL: &str = "https://keystone.wjv-1.neo.id:443/v3";
pub const DEFAULT_USER_DOMAIN_NAME: &str = "neo.id";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub auth_url: Option<String>,
    pub user_domain_name: Option<String>,
    pub credential_path: Option<PathBuf>,
    pub session_path: Option<PathBuf>,
}

/// Where the credential file and session cache live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub credentials: PathBuf,
    pub session: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the log file.
    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn auth_url(&self) -> &str {
        self.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL)
    }

    pub fn user_domain_name(&self) -> &str {
        self.user_domain_name.as_deref().unwrap_or(DEFAULT_USER_DOMAIN_NAME)
    }

    pub fn paths(&self) -> Result<Paths> {
        let credentials = match self.credential_path {
            Some(ref path) => path.clone(),
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
                .join(CREDENTIAL_FILE),
        };
        let session = self
            .session_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(SESSION_FILE));

        Ok(Paths {
            credentials,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.auth_url(), DEFAULT_AUTH_URL);
        assert_eq!(config.user_domain_name(), DEFAULT_USER_DOMAIN_NAME);
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"auth_url": "https://id.example/v3"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.auth_url(), "https://id.example/v3");
        assert_eq!(config.user_domain_name(), DEFAULT_USER_DOMAIN_NAME);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_paths_overrides() {
        let config = Config {
            credential_path: Some(PathBuf::from("/srv/creds.env")),
            session_path: Some(PathBuf::from("/run/session.json")),
            ..Config::default()
        };
        let paths = config.paths().unwrap();
        assert_eq!(paths.credentials, PathBuf::from("/srv/creds.env"));
        assert_eq!(paths.session, PathBuf::from("/run/session.json"));
    }

    #[test]
    fn test_default_session_path_is_in_temp_dir() {
        let config = Config {
            credential_path: Some(PathBuf::from("/srv/creds.env")),
            ..Config::default()
        };
        let paths = config.paths().unwrap();
        assert_eq!(paths.session, std::env::temp_dir().join(SESSION_FILE));
    }
}
