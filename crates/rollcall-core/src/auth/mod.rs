//! Credential storage and role derivation.
//!
//! This module provides:
//! - `CredentialProvider` / `CredentialStore`: where the signed token lives
//!   (OS keychain, a file in the cache directory, or memory)
//! - `RoleResolver`: reads the role claim out of the stored token
//!
//! Roles are a display hint only. The token signature is never checked
//! here; the service decides what a caller may actually do.

pub mod credentials;
pub mod roles;

pub use credentials::{
    CredentialProvider, CredentialStore, FileCredentials, KeyringCredentials, StaticCredential,
};
pub use roles::{RoleResolver, TokenError, DEFAULT_PRIVILEGED_ROLE};
