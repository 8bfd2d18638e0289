//! Session lifecycle: decides on every invocation whether to reuse the cached
//! session, regenerate it from saved credentials, or run a fresh interactive
//! login.
//!
//! | credentials | session | action                                        |
//! |-------------|---------|-----------------------------------------------|
//! | yes         | yes     | same identity: nothing; otherwise fresh login |
//! | yes         | no      | regenerate from saved credentials             |
//! | no          | any     | fresh login                                   |
//!
//! Errors during login are logged and collapsed into [`LoginFailed`]. Nothing
//! is rolled back: a failure between the session write and the credential
//! write leaves the two files describing different logins.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::auth::{
    is_same_identity, AuthError, AuthProvider, CredentialRecord, CredentialStore, PasswordAuth,
    SessionCache, SessionHandle, StoreError,
};
use crate::config::Paths;

/// Interactive input and user-facing notices.
pub trait Prompt {
    /// Ask for a username. `default` is offered when the caller already
    /// knows which account is wanted.
    fn username(&mut self, default: Option<&str>) -> io::Result<String>;

    fn password(&mut self) -> io::Result<String>;

    fn notice(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub auth_url: String,
    pub user_domain_name: String,
    /// Account to compare against the saved one. `None` compares against the
    /// saved username, so only an endpoint or domain change forces a new login.
    pub username: Option<String>,
}

impl LoginRequest {
    pub fn new(auth_url: impl Into<String>, user_domain_name: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            user_domain_name: user_domain_name.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    AlreadyLoggedIn,
    Regenerated,
    FreshLogin { switched_account: bool },
}

/// Login did not complete. Details are logged, not carried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Login Failed")]
pub struct LoginFailed;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session regeneration reported success but {} was not written", .0.display())]
    RegenerationProducedNoSession(PathBuf),

    #[error("Username and password required")]
    MissingInput,

    #[error("Failed to read input: {0}")]
    Prompt(#[source] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// The saved account, without its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub username: String,
    pub auth_url: String,
    pub user_domain_name: String,
    pub project_id: String,
    pub has_session: bool,
}

pub struct SessionManager<P, T> {
    credentials: CredentialStore,
    sessions: SessionCache,
    provider: P,
    prompt: T,
}

impl<P: AuthProvider, T: Prompt> SessionManager<P, T> {
    pub fn new(paths: &Paths, provider: P, prompt: T) -> Self {
        Self {
            credentials: CredentialStore::new(paths.credentials.clone()),
            sessions: SessionCache::new(paths.session.clone()),
            provider,
            prompt,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn prompt(&self) -> &T {
        &self.prompt
    }

    pub async fn login(&mut self, request: &LoginRequest) -> Result<LoginOutcome, LoginFailed> {
        match self.try_login(request).await {
            Ok(outcome) => {
                info!(?outcome, auth_url = %request.auth_url, "Login finished");
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, auth_url = %request.auth_url, "Login failed");
                Err(LoginFailed)
            }
        }
    }

    async fn try_login(&mut self, request: &LoginRequest) -> Result<LoginOutcome, SessionError> {
        let has_credentials = self.credentials.exists();
        let has_session = self.sessions.exists();
        debug!(has_credentials, has_session, "Evaluating login state");

        match (has_credentials, has_session) {
            (true, true) => {
                let cached = self.credentials.read()?;
                let username = request.username.as_deref().unwrap_or(cached.username.as_str());
                if is_same_identity(
                    &cached,
                    &request.auth_url,
                    &request.user_domain_name,
                    username,
                ) {
                    return Ok(LoginOutcome::AlreadyLoggedIn);
                }
                self.prompt.notice("Doing fresh login. You switched user account");
                self.fresh_login(request).await?;
                Ok(LoginOutcome::FreshLogin {
                    switched_account: true,
                })
            }
            (true, false) => {
                self.prompt.notice("Retrieving old login data ...");
                self.regenerate().await?;
                Ok(LoginOutcome::Regenerated)
            }
            (false, _) => {
                self.prompt.notice("Doing fresh login. You don't have old login data");
                self.fresh_login(request).await?;
                Ok(LoginOutcome::FreshLogin {
                    switched_account: false,
                })
            }
        }
    }

    async fn fresh_login(&mut self, request: &LoginRequest) -> Result<SessionHandle, SessionError> {
        let username = self
            .prompt
            .username(request.username.as_deref())
            .map_err(SessionError::Prompt)?;
        let password = self.prompt.password().map_err(SessionError::Prompt)?;
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::MissingInput);
        }

        let mut auth = PasswordAuth {
            username,
            password,
            auth_url: request.auth_url.clone(),
            user_domain_name: request.user_domain_name.clone(),
            project_id: None,
        };

        let unscoped = self.provider.authenticate(&auth).await?;
        let project_id = self.provider.resolve_default_project(&unscoped).await?;
        debug!(user_id = %unscoped.user_id(), %project_id, "Resolved default project");

        auth.project_id = Some(project_id.clone());
        let session = self.provider.authenticate(&auth).await?;
        self.sessions.write(&session)?;

        let record = CredentialRecord {
            username: auth.username,
            password: auth.password,
            auth_url: auth.auth_url,
            user_domain_name: auth.user_domain_name,
            project_id,
        };
        self.credentials.write(&record)?;
        Ok(session)
    }

    /// Re-establish the session from saved credentials without prompting.
    async fn regenerate(&self) -> Result<SessionHandle, SessionError> {
        let record = self.credentials.read().map_err(|e| match e {
            StoreError::NotFound(_) => SessionError::NotLoggedIn,
            other => other.into(),
        })?;

        let session = self.provider.authenticate(&PasswordAuth::from(&record)).await?;
        self.sessions.write(&session)?;
        info!(username = %record.username, "Session regenerated from saved credentials");
        Ok(session)
    }

    /// Delete the session cache and credentials. Does nothing unless a
    /// session is cached; returns whether anything was removed.
    pub fn logout(&self) -> bool {
        if !self.sessions.exists() {
            debug!("No cached session, nothing to log out");
            return false;
        }

        if let Err(e) = self.sessions.delete() {
            warn!(error = %e, "Failed to remove session cache");
        }
        if let Err(e) = self.credentials.delete() {
            warn!(error = %e, "Failed to remove credential file");
        }
        info!("Logged out");
        true
    }

    /// The cached session, regenerating it once from saved credentials if the
    /// cache is missing.
    pub async fn load_active_session(&self) -> Result<SessionHandle, SessionError> {
        if self.sessions.exists() {
            return Ok(self.sessions.read()?);
        }

        debug!("No cached session, regenerating");
        self.regenerate().await?;

        if !self.sessions.exists() {
            return Err(SessionError::RegenerationProducedNoSession(
                self.sessions.path().to_path_buf(),
            ));
        }
        Ok(self.sessions.read()?)
    }

    pub fn current_account(&self) -> Option<AccountSummary> {
        match self.credentials.read() {
            Ok(record) => Some(AccountSummary {
                username: record.username,
                auth_url: record.auth_url,
                user_domain_name: record.user_domain_name,
                project_id: record.project_id,
                has_session: self.sessions.exists(),
            }),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read saved credentials");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
