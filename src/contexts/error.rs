use crate::data::RequestError;
use thiserror::Error;

/// Errors that can end a single generation call.
///
/// Constraint violations are deliberately absent: a result that is still over
/// a bound after repair is a degraded success and travels inside
/// [`GenerationResult`](crate::data::GenerationResult).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("no credentials were supplied for the generation endpoint")]
    MissingCredentials,
    #[error("credentials were rejected by the generation endpoint: {0}")]
    AuthenticationRejected(String),
    #[error("rate limited by the generation endpoint: {0}")]
    RateLimited(String),
    #[error("generation endpoint rejected the request as malformed: {0}")]
    BadRequest(String),
    #[error("generation endpoint failed: {0}")]
    UpstreamError(String),
    #[error("model output was not a valid JSON object: {0}")]
    InvalidFormat(String),
    #[error("cancelled before the request was sent")]
    Cancelled,
}

/// Fieldless view of [`GenerationError`] for matching and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    MissingCredentials,
    AuthenticationRejected,
    RateLimited,
    BadRequest,
    UpstreamError,
    InvalidFormat,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::MissingCredentials => "missing_credentials",
            ErrorKind::AuthenticationRejected => "authentication_rejected",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GenerationError::MissingCredentials => ErrorKind::MissingCredentials,
            GenerationError::AuthenticationRejected(_) => ErrorKind::AuthenticationRejected,
            GenerationError::RateLimited(_) => ErrorKind::RateLimited,
            GenerationError::BadRequest(_) => ErrorKind::BadRequest,
            GenerationError::UpstreamError(_) => ErrorKind::UpstreamError,
            GenerationError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            GenerationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether trying the same request again later may succeed without caller action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimited | ErrorKind::UpstreamError | ErrorKind::InvalidFormat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(GenerationError::RateLimited("slow down".into()).is_retryable());
        assert!(GenerationError::UpstreamError("503".into()).is_retryable());
        assert!(GenerationError::InvalidFormat("not json".into()).is_retryable());
        assert!(!GenerationError::MissingCredentials.is_retryable());
        assert!(!GenerationError::AuthenticationRejected("bad key".into()).is_retryable());
        assert!(!GenerationError::BadRequest("oops".into()).is_retryable());
    }

    #[test]
    fn test_request_error_converts() {
        let err: GenerationError = RequestError::NoLimits.into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.to_string(), "invalid request: at least one limit is required");
    }
}
