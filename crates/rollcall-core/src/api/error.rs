use thiserror::Error;

/// Coarse failure classes. Read paths swallow all of them, write paths
/// surface them to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be sent or the response could not be read.
    Network,
    /// A response arrived with a non-success status.
    Status,
    /// The body was not the expected shape.
    Shape,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            code => ApiError::UnexpectedStatus {
                status: code,
                body: truncated,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NetworkError(_) => ErrorKind::Network,
            ApiError::InvalidResponse(_) => ErrorKind::Shape,
            ApiError::AccessDenied(_)
            | ApiError::Unauthorized
            | ApiError::NotFound(_)
            | ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::UnexpectedStatus { .. } => ErrorKind::Status,
        }
    }

    /// Classify an error produced by `EventClient`, looking through any
    /// context attached to it.
    pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<ApiError>().map(ApiError::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
            ApiError::NotFound(ref b) if b == "gone"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "dup"),
            ApiError::UnexpectedStatus { status: 409, .. }
        ));
    }

    #[test]
    fn test_status_errors_classify_as_status() {
        for code in [400u16, 401, 403, 404, 409, 429, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(ApiError::from_status(status, "").kind(), ErrorKind::Status);
        }
        assert_eq!(
            ApiError::InvalidResponse("not an array".into()).kind(),
            ErrorKind::Shape
        );
    }

    #[test]
    fn test_kind_of_sees_through_context() {
        use anyhow::Context;

        let result: anyhow::Result<()> =
            Err(ApiError::Unauthorized).context("Failed to register for event 42");
        let err = result.unwrap_err();
        assert_eq!(ApiError::kind_of(&err), Some(ErrorKind::Status));
        assert_eq!(ApiError::kind_of(&anyhow::anyhow!("other")), None);
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
