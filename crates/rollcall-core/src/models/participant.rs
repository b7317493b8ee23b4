use serde::{Deserialize, Deserializer, Serialize};

use super::ResourceId;

/// A participant record as returned by the service.
///
/// Requests are sent in PascalCase while responses usually come back in
/// camelCase, so both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, alias = "UserName", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, alias = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "Confirmed", deserialize_with = "null_as_false")]
    pub confirmed: bool,
}

/// Services that serialize unset booleans as `null` mean "not confirmed".
fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

impl Participant {
    /// Name to show for this participant, falling back to the user name
    /// and then the id.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .or(self.user_name.as_deref())
            .map(str::to_string)
            .or_else(|| self.id.as_ref().map(|id| id.to_string()))
            .unwrap_or_else(|| "(unnamed)".to_string())
    }
}

/// Body of the register and confirm requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParticipantRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub user_name: String,
    pub name: String,
    pub confirmed: bool,
}

impl ParticipantRequest {
    /// New registration. Always unconfirmed; only the confirm endpoint
    /// can flip the flag.
    pub fn registration(participant_name: &str) -> Self {
        Self {
            id: None,
            user_name: participant_name.to_string(),
            name: participant_name.to_string(),
            confirmed: false,
        }
    }

    /// Confirmation update. The participant id doubles as user and display
    /// name, which is how the service locates the record.
    pub fn confirmation(participant_id: &ResourceId, confirmed: bool) -> Self {
        let surrogate = participant_id.to_string();
        Self {
            id: Some(participant_id.clone()),
            user_name: surrogate.clone(),
            name: surrogate,
            confirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_body() {
        let body = serde_json::to_value(ParticipantRequest::registration("Bob")).unwrap();
        assert_eq!(body, json!({"UserName": "Bob", "Name": "Bob", "Confirmed": false}));
    }

    #[test]
    fn test_confirmation_body() {
        let id = ResourceId::from("alice");
        let body = serde_json::to_value(ParticipantRequest::confirmation(&id, true)).unwrap();
        assert_eq!(
            body,
            json!({"Id": "alice", "UserName": "alice", "Name": "alice", "Confirmed": true})
        );
    }

    #[test]
    fn test_parse_either_casing() {
        let camel: Participant =
            serde_json::from_str(r#"{"id": 3, "userName": "bob", "name": "Bob", "confirmed": true}"#)
                .unwrap();
        let pascal: Participant =
            serde_json::from_str(r#"{"Id": 3, "UserName": "bob", "Name": "Bob", "Confirmed": true}"#)
                .unwrap();
        assert_eq!(camel, pascal);
        assert!(camel.confirmed);
    }

    #[test]
    fn test_null_confirmed_reads_as_false() {
        let p: Participant =
            serde_json::from_str(r#"{"id": 2, "name": null, "confirmed": null}"#).unwrap();
        assert!(!p.confirmed);
        assert_eq!(p.display_name(), "2");
    }

    #[test]
    fn test_confirmed_defaults_false() {
        let p: Participant = serde_json::from_str(r#"{"name": "Bob"}"#).unwrap();
        assert!(!p.confirmed);
        assert_eq!(p.display_name(), "Bob");
    }
}
