//! REST client module for the events service.
//!
//! This module provides the `EventClient` for listing, fetching and
//! creating events and for registering, confirming and removing their
//! participants. Failures are reported through `ApiError`, classified by
//! `ErrorKind`.

pub mod client;
pub mod error;

pub use client::{declared_content_length, EventClient};
pub use error::{ApiError, ErrorKind};
