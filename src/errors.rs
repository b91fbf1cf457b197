use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Classification of upstream AWS service errors, derived from the
/// service error code carried in the response metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    NotFound,
    AccessDenied,
    Transient,
    Unknown,
}

impl LookupErrorKind {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(
                "DBClusterNotFoundFault"
                | "DBInstanceNotFoundFault"
                | "ResourceNotFoundException"
                | "NoSuchKey",
            ) => LookupErrorKind::NotFound,
            Some("AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation") => {
                LookupErrorKind::AccessDenied
            }
            Some(
                "Throttling"
                | "ThrottlingException"
                | "TooManyRequestsException"
                | "RequestTimeout"
                | "ServiceUnavailable"
                | "InternalServiceError",
            ) => LookupErrorKind::Transient,
            _ => LookupErrorKind::Unknown,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Secret lookup failed for [{name}] ({kind:?}): {message}")]
    Secrets {
        name: String,
        kind: LookupErrorKind,
        message: String,
    },

    #[error("Secret [{0}] has a binary payload; expected a username/password JSON document")]
    UnsupportedSecretFormat(String),

    #[error("Endpoint lookup failed for [{identifier}] ({kind:?}): {message}")]
    Endpoint {
        identifier: String,
        kind: LookupErrorKind,
        message: String,
    },

    #[error("Dump pipeline failed with {status}: {stderr}")]
    DumpFailed { status: String, stderr: String },

    #[error("Dump pipeline timed out after {0} second(s)")]
    DumpTimeout(u64),

    #[error("Failed to generate signed URL for [{key}]: {message}")]
    Presign { key: String, message: String },

    #[error("Failed to publish notification to [{topic}]: {message}")]
    Publish { topic: String, message: String },

    #[error("Failed to launch backup task: {0}")]
    TaskLaunch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// The inbound trigger contract defines no error statuses; a failed task
// launch surfaces as a plain-text 500 rather than a process fault.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes_classify_as_not_found() {
        assert_eq!(
            LookupErrorKind::from_code(Some("DBClusterNotFoundFault")),
            LookupErrorKind::NotFound
        );
        assert_eq!(
            LookupErrorKind::from_code(Some("DBInstanceNotFoundFault")),
            LookupErrorKind::NotFound
        );
        assert_eq!(
            LookupErrorKind::from_code(Some("ResourceNotFoundException")),
            LookupErrorKind::NotFound
        );
    }

    #[test]
    fn test_access_denied_codes_classify_as_access_denied() {
        assert_eq!(
            LookupErrorKind::from_code(Some("AccessDeniedException")),
            LookupErrorKind::AccessDenied
        );
        assert_eq!(
            LookupErrorKind::from_code(Some("AccessDenied")),
            LookupErrorKind::AccessDenied
        );
    }

    #[test]
    fn test_throttling_codes_classify_as_transient() {
        assert_eq!(
            LookupErrorKind::from_code(Some("ThrottlingException")),
            LookupErrorKind::Transient
        );
        assert_eq!(
            LookupErrorKind::from_code(Some("ServiceUnavailable")),
            LookupErrorKind::Transient
        );
    }

    #[test]
    fn test_unrecognized_or_missing_codes_classify_as_unknown() {
        assert_eq!(
            LookupErrorKind::from_code(Some("SomethingElseEntirely")),
            LookupErrorKind::Unknown
        );
        assert_eq!(LookupErrorKind::from_code(None), LookupErrorKind::Unknown);
    }
}
