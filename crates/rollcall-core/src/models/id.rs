use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of an event or participant.
///
/// The service assigns numeric ids to events, while participants may be
/// addressed by a display-name surrogate, so both forms are accepted and
/// written back in the form they arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        ResourceId::Number(n)
    }
}

impl From<i32> for ResourceId {
    fn from(n: i32) -> Self {
        ResourceId::Number(n.into())
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        ResourceId::Text(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        ResourceId::Text(s)
    }
}

/// Parses digits as a numeric id and anything else as text. Never fails.
impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => ResourceId::Number(n),
            Err(_) => ResourceId::Text(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_and_text() {
        assert_eq!("42".parse::<ResourceId>().unwrap(), ResourceId::Number(42));
        assert_eq!(
            "bob".parse::<ResourceId>().unwrap(),
            ResourceId::Text("bob".to_string())
        );
    }

    #[test]
    fn test_serializes_as_received() {
        assert_eq!(serde_json::to_string(&ResourceId::from(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&ResourceId::from("p-1")).unwrap(), "\"p-1\"");

        let parsed: ResourceId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed.to_string(), "abc");
    }
}
