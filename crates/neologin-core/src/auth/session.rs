use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StoreError;
use super::file::{remove_if_exists, write_private};

/// On-disk format version of [`SessionHandle`].
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// An authenticated session issued by the identity service.
///
/// Validity is optimistic: nothing here tracks token expiry. A revoked or
/// expired token is only discovered when a call made with it fails.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    version: u32,
    token: String,
    user_id: String,
    project_id: Option<String>,
    auth_url: String,
    /// When the token was obtained. Informational only.
    issued_at: DateTime<Utc>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("version", &self.version)
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("auth_url", &self.auth_url)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl SessionHandle {
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        project_id: Option<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            version: SESSION_FORMAT_VERSION,
            token: token.into(),
            user_id: user_id.into(),
            project_id,
            auth_url: auth_url.into(),
            issued_at: Utc::now(),
        }
    }

    /// On-disk format version this handle was written with.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The bearer token, sent as `X-Auth-Token`.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The project this session is scoped to, if any.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn is_scoped(&self) -> bool {
        self.project_id.is_some()
    }
}

/// JSON session cache at a fixed path, normally under the system temp dir.
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<SessionHandle, StoreError> {
        if !self.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let contents = std::fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let handle: SessionHandle =
            serde_json::from_slice(&contents).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if handle.version != SESSION_FORMAT_VERSION {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: format!("unsupported session format version {}", handle.version),
            });
        }

        Ok(handle)
    }

    /// Replace the cached session with `handle`.
    pub fn write(&self, handle: &SessionHandle) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(handle).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        write_private(&self.path, &contents).map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), user_id = %handle.user_id, "Session cached");
        Ok(())
    }

    pub fn delete(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &tempfile::TempDir) -> SessionCache {
        SessionCache::new(dir.path().join("session.json"))
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        assert!(!cache.exists());

        let handle = SessionHandle::new(
            "gAAAAAB-token",
            "u-42",
            Some("p-1".to_string()),
            "https://id.example/v3",
        );
        cache.write(&handle).unwrap();

        assert!(cache.exists());
        let loaded = cache.read().unwrap();
        assert_eq!(loaded, handle);
        assert_eq!(loaded.token(), "gAAAAAB-token");
        assert_eq!(loaded.project_id(), Some("p-1"));
        assert!(loaded.is_scoped());
        assert_eq!(loaded.version(), SESSION_FORMAT_VERSION);
        assert_eq!(loaded.issued_at(), handle.issued_at());
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cache_in(&dir).read().unwrap_err().is_not_found());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        std::fs::write(cache.path(), b"\x80\x04\x95 pickle bytes").unwrap();

        assert!(matches!(cache.read(), Err(StoreError::Corrupt { .. })));

        std::fs::write(cache.path(), "{\"token\": 1}").unwrap();
        assert!(matches!(cache.read(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        let mut handle = SessionHandle::new("t", "u", None, "https://id.example/v3");
        handle.version = SESSION_FORMAT_VERSION + 1;
        cache.write(&handle).unwrap();

        match cache.read() {
            Err(StoreError::Corrupt { reason, .. }) => assert!(reason.contains("version")),
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.write(&SessionHandle::new("t", "u", None, "https://id.example/v3")).unwrap();

        cache.delete().unwrap();
        assert!(!cache.exists());
        cache.delete().unwrap();
    }

    #[test]
    fn test_debug_redacts_token() {
        let handle = SessionHandle::new("very-secret-token", "u", None, "https://id.example/v3");
        assert!(!format!("{:?}", handle).contains("very-secret-token"));
    }
}
