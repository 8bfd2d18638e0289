//! Authentication state kept between invocations.
//!
//! This module provides:
//! - `CredentialStore`: the `OS_*` credential file in the user's home directory
//! - `SessionCache`: the serialized `SessionHandle` in the temp directory
//! - `is_same_identity`: detects an account switch between logins
//! - `AuthProvider`: the identity service seen from the login lifecycle
//!
//! Neither file is locked. Two concurrent invocations can race and leave
//! either file inconsistent.
//!
//! The session cache has a fixed name in the shared temp directory. On a
//! multi-user host another user can occupy that path first:
//! - a file owned by someone else cannot be opened or chmodded, so every
//!   session write fails and login keeps failing until it is removed or
//!   `session_path` is moved in the config file;
//! - a world-writable file planted there would leak the token, because the
//!   `0600` open mode only applies on create. Writes therefore chmod an
//!   existing file to `0600` first and refuse it when that is not permitted.
//!
//! Neither protection holds when running as root, which may chmod any file.

pub mod credentials;
pub mod error;
mod file;
pub mod identity;
pub mod provider;
pub mod session;

pub use credentials::{CredentialRecord, CredentialStore};
pub use error::{AuthError, StoreError};
pub use identity::is_same_identity;
pub use provider::{AuthProvider, PasswordAuth};
pub use session::{SessionCache, SessionHandle, SESSION_FORMAT_VERSION};
