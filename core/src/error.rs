//! Error types for the FarmOpsX client.
//!
//! # Design
//! Response failures come in two kinds. `ResourceError` covers the statuses
//! the API uses for expected rejections (bad request, forbidden, not found,
//! gone); `ServiceError` covers everything else. Callers branch on the kind
//! to tell "that channel does not exist" apart from "the service is broken".
//! The remaining variants are raised before or around the HTTP round-trip.

use thiserror::Error;

use crate::http::TransportError;

/// Statuses reported as `ApiError::ResourceError`.
pub const RESOURCE_ERROR_STATUSES: [u16; 4] = [400, 403, 404, 410];

/// Message used when a failed response carries no `error` member.
pub const UNKNOWN_ERROR: &str = "Error unknown.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400, 403, 404 or 410: the API rejected the request.
    #[error("resource error ({status}): {message}")]
    ResourceError { status: u16, message: String },

    /// Any other failed status, or a success status without content.
    #[error("service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    /// A `:name` placeholder in the target had no matching option.
    #[error("unresolved placeholder `:{name}` in target `{target}`")]
    UnresolvedPlaceholder { target: String, name: String },

    /// A placeholder option was null, an array, an object, or a string that
    /// is empty or a dot segment (`.`, `..`).
    #[error("option `{name}` cannot be used as a path segment")]
    InvalidPathValue { name: String },

    #[error("transport failed: {0}")]
    TransportError(#[from] TransportError),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// HTTP status of a response failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ResourceError { status, .. } | ApiError::ServiceError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The API's own error message, for response failures.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::ResourceError { message, .. } | ApiError::ServiceError { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn is_resource_error(&self) -> bool {
        matches!(self, ApiError::ResourceError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_and_message() {
        let err = ApiError::ResourceError {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "resource error (404): not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), Some("not found"));
        assert!(err.is_resource_error());
    }

    #[test]
    fn transport_errors_convert_with_question_mark() {
        fn fails() -> Result<(), ApiError> {
            Err(TransportError::new("connection refused"))?
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, ApiError::TransportError(_)));
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }
}
