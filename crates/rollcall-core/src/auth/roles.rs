use std::collections::BTreeSet;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::CredentialProvider;

/// Role that marks a user as privileged unless configured otherwise.
pub const DEFAULT_PRIVILEGED_ROLE: &str = "admin";

/// Claim the roles are read from.
const ROLE_CLAIM: &str = "role";

/// URL-safe alphabet, padding optional, lenient about trailing bits.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is not of the form header.payload.signature")]
    Malformed,

    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("token payload is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the claims segment of a compact token without checking the
/// signature. Standard-alphabet `+` and `/` are accepted as well.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let normalized = parts[1].replace('+', "-").replace('/', "_");
    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    let text = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&text)?)
}

/// Roles named by the `role` claim. A single string becomes a one-element
/// set, a missing or null claim an empty one; non-string array members and
/// empty names are skipped.
pub fn roles_from_claims(claims: &Map<String, Value>) -> BTreeSet<String> {
    match claims.get(ROLE_CLAIM) {
        Some(Value::String(role)) if !role.is_empty() => BTreeSet::from([role.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

pub fn roles_from_token(token: &str) -> Result<BTreeSet<String>, TokenError> {
    decode_claims(token).map(|claims| roles_from_claims(&claims))
}

/// Derives roles from whatever token the provider currently holds.
///
/// Nothing is cached: every call reads the provider again, so a login or
/// logout is reflected on the next query.
#[derive(Clone)]
pub struct RoleResolver {
    provider: Arc<dyn CredentialProvider>,
    privileged_role: String,
}

impl RoleResolver {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            privileged_role: DEFAULT_PRIVILEGED_ROLE.to_string(),
        }
    }

    pub fn with_privileged_role(mut self, role: impl Into<String>) -> Self {
        self.privileged_role = role.into();
        self
    }

    pub fn privileged_role(&self) -> &str {
        &self.privileged_role
    }

    /// Current role set. Empty when no token is stored or it cannot be decoded.
    pub fn roles(&self) -> BTreeSet<String> {
        let Some(token) = self.provider.get_credential() else {
            return BTreeSet::new();
        };
        match roles_from_token(&token) {
            Ok(roles) => roles,
            Err(e) => {
                debug!(error = %e, "Ignoring undecodable credential");
                BTreeSet::new()
            }
        }
    }

    /// True if any role matches the privileged role, ignoring case.
    pub fn is_privileged(&self) -> bool {
        self.roles()
            .iter()
            .any(|role| role.to_lowercase() == self.privileged_role.to_lowercase())
    }
}
