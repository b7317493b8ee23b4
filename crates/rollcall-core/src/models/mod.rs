//! Data models for the events service.
//!
//! - `Event`: an event as returned by the service, with its participants
//! - `EventDraft`: the payload used to create an event
//! - `Participant`, `ParticipantRequest`: participant records and the
//!   payloads sent when registering or confirming
//! - `ResourceId`: numeric or textual identifiers assigned by the service

pub mod event;
pub mod id;
pub mod participant;

pub use event::{Event, EventDraft};
pub use id::ResourceId;
pub use participant::{Participant, ParticipantRequest};
