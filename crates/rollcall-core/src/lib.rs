//! Client-side data access for an event and participant service.
//!
//! - [`api::EventClient`] talks to the remote events API and keeps an
//!   observable cache of the event list
//! - [`auth::RoleResolver`] derives display roles from a stored token
//! - [`config::Config`] locates the service and the credential store

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiError, ErrorKind, EventClient};
pub use auth::{CredentialProvider, CredentialStore, RoleResolver};
pub use cache::EventStore;
pub use config::Config;
pub use models::{Event, EventDraft, Participant, ResourceId};
