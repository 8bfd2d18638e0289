//! REST client module for Keystone v3 identity services.
//!
//! This module provides the `KeystoneClient`, the production
//! [`AuthProvider`](crate::auth::AuthProvider). It issues password
//! authentication requests against `{auth_url}/auth/tokens` and lists the
//! projects visible to the authenticated user.

pub mod client;
pub mod error;

pub use client::KeystoneClient;
pub use error::ApiError;
