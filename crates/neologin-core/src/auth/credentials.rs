use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::StoreError;
use super::file::{remove_if_exists, write_private};

pub const OS_USERNAME: &str = "OS_USERNAME";
pub const OS_PASSWORD: &str = "OS_PASSWORD";
pub const OS_AUTH_URL: &str = "OS_AUTH_URL";
pub const OS_PROJECT_ID: &str = "OS_PROJECT_ID";
pub const OS_USER_DOMAIN_NAME: &str = "OS_USER_DOMAIN_NAME";

/// Credentials saved after a successful fresh login.
///
/// All five fields are required; a file missing any of them is rejected
/// as malformed rather than partially loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub user_domain_name: String,
    pub project_id: String,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("user_domain_name", &self.user_domain_name)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl CredentialRecord {
    /// The `OS_*` variables in the order they are written to disk.
    pub fn env_pairs(&self) -> [(&'static str, &str); 5] {
        [
            (OS_USERNAME, self.username.as_str()),
            (OS_PASSWORD, self.password.as_str()),
            (OS_AUTH_URL, self.auth_url.as_str()),
            (OS_PROJECT_ID, self.project_id.as_str()),
            (OS_USER_DOMAIN_NAME, self.user_domain_name.as_str()),
        ]
    }

    fn to_env_file(&self) -> String {
        self.env_pairs()
            .iter()
            .map(|(key, value)| format!("{}={}\n", key, encode_value(value)))
            .collect()
    }
}

/// Dotenv-style credential file at a fixed path.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Parse the credential file without touching the process environment.
    pub fn read(&self) -> Result<CredentialRecord, StoreError> {
        if !self.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let entries = dotenvy::from_path_iter(&self.path).map_err(|e| self.parse_error(e))?;
        let mut values = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|e| self.parse_error(e))?;
            values.insert(key, value);
        }

        Ok(CredentialRecord {
            username: self.take(&mut values, OS_USERNAME)?,
            password: self.take(&mut values, OS_PASSWORD)?,
            auth_url: self.take(&mut values, OS_AUTH_URL)?,
            user_domain_name: self.take(&mut values, OS_USER_DOMAIN_NAME)?,
            project_id: self.take(&mut values, OS_PROJECT_ID)?,
        })
    }

    /// Overwrite the credential file with `record`.
    pub fn write(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        write_private(&self.path, &record.to_env_file())
            .map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), username = %record.username, "Credentials saved");
        Ok(())
    }

    pub fn delete(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn take(&self, values: &mut HashMap<String, String>, key: &str) -> Result<String, StoreError> {
        match values.remove(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(StoreError::Malformed {
                path: self.path.clone(),
                reason: format!("missing {}", key),
            }),
        }
    }

    fn parse_error(&self, error: dotenvy::Error) -> StoreError {
        match error {
            dotenvy::Error::Io(source) => StoreError::io(&self.path, source),
            other => StoreError::Malformed {
                path: self.path.clone(),
                reason: other.to_string(),
            },
        }
    }
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_.:/@+=,%~".contains(c)
}

/// Quote values that a dotenv parser would otherwise split or substitute.
fn encode_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_plain_char) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
