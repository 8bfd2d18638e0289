//! Credential and session management for command-line clients of Keystone v3
//! identity services.
//!
//! A successful login leaves two files behind: the `OS_*` credential file in
//! the user's home directory and a cached session token in the temp
//! directory. Later invocations reuse the session, regenerate it silently from
//! the credentials, or fall back to an interactive login. See [`lifecycle`].

pub mod api;
pub mod auth;
pub mod config;
pub mod lifecycle;

pub use api::{ApiError, KeystoneClient};
pub use auth::{
    is_same_identity, AuthError, AuthProvider, CredentialRecord, CredentialStore, PasswordAuth,
    SessionCache, SessionHandle, StoreError,
};
pub use config::{Config, Paths};
pub use lifecycle::{
    AccountSummary, LoginFailed, LoginOutcome, LoginRequest, Prompt, SessionError, SessionManager,
};
