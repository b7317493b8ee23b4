use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Participant, ResourceId};

/// An event as held by the remote service.
///
/// The object the service sent is kept as-is and is what gets serialized
/// back, so nulls, empty lists and unknown fields all survive. The typed
/// fields are read from it leniently: a `null` or mistyped value reads as
/// absent instead of rejecting the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Event {
    id: Option<ResourceId>,
    name: Option<String>,
    description: Option<String>,
    date: Option<String>,
    location: Option<String>,
    participants: Vec<Participant>,
    raw: Map<String, Value>,
}

/// Look up a field by its camelCase name, falling back to PascalCase.
fn field<'a>(raw: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    raw.get(name).or_else(|| {
        let mut chars = name.chars();
        let pascal: String = chars
            .next()
            .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
            .unwrap_or_default();
        raw.get(&pascal)
    })
}

fn text_field(raw: &Map<String, Value>, name: &str) -> Option<String> {
    field(raw, name).and_then(Value::as_str).map(str::to_string)
}

impl From<Map<String, Value>> for Event {
    fn from(raw: Map<String, Value>) -> Self {
        let id = field(&raw, "id")
            .filter(|v| v.is_number() || v.is_string())
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let participants = field(&raw, "participants")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match serde_json::from_value(item.clone()) {
                        Ok(participant) => Some(participant),
                        Err(e) => {
                            debug!(error = %e, "Skipping unreadable participant");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            name: text_field(&raw, "name"),
            description: text_field(&raw, "description"),
            date: text_field(&raw, "date"),
            location: text_field(&raw, "location"),
            participants,
            raw,
        }
    }
}

impl From<Event> for Map<String, Value> {
    fn from(event: Event) -> Self {
        event.raw
    }
}

impl Event {
    pub fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// The object exactly as the service sent it.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(untitled)")
    }

    pub fn confirmed_count(&self) -> usize {
        self.participants.iter().filter(|p| p.confirmed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.participants.len() - self.confirmed_count()
    }

    pub fn formatted_date(&self) -> String {
        match &self.date {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y").to_string()
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
                    // Server timestamps often come without an offset
                    dt.format("%b %d, %Y").to_string()
                } else {
                    date.chars().take(10).collect()
                }
            }
            None => "TBD".to_string(),
        }
    }
}

/// Payload for a new event; the service assigns the id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Additional fields passed through to the service untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
