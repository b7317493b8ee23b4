//! In-memory cache of the event list.
//!
//! `EventStore` holds the last list fetched from the service and lets
//! readers take snapshots or subscribe to replacements. Only
//! `EventClient::fetch_events` writes to it: a successful fetch replaces
//! the list, a failed one empties it.

pub mod store;

pub use store::{CachedData, EventSnapshot, EventStore};
