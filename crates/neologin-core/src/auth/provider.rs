use std::fmt;

use async_trait::async_trait;

use super::credentials::CredentialRecord;
use super::error::AuthError;
use super::session::SessionHandle;

/// Parameters for a password authentication call.
///
/// `project_id: None` requests an unscoped token, used only long enough to
/// discover the user's default project.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordAuth {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub user_domain_name: String,
    pub project_id: Option<String>,
}

impl fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("user_domain_name", &self.user_domain_name)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl From<&CredentialRecord> for PasswordAuth {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            username: record.username.clone(),
            password: record.password.clone(),
            auth_url: record.auth_url.clone(),
            user_domain_name: record.user_domain_name.clone(),
            project_id: Some(record.project_id.clone()),
        }
    }
}

/// An identity service able to issue sessions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, request: &PasswordAuth) -> Result<SessionHandle, AuthError>;

    /// First project the service lists for the session's user. No ordering
    /// is imposed; whatever the service returns first wins.
    async fn resolve_default_project(&self, session: &SessionHandle) -> Result<String, AuthError>;
}
