//! Error types for metadata discovery.

use std::error::Error as _;

use thiserror::Error;

/// Message carried by every [`UnavailableError`].
pub const UNAVAILABLE_MESSAGE: &str =
    "metadata service unavailable - not running on supported cloud platform";

/// Errors from a single metadata request.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata endpoint does not exist (HTTP 404).
    #[error("metadata not found")]
    NotFound,

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// HTTP error with status code.
    #[error("http {0}")]
    Http(u16),

    /// Response was not valid UTF-8.
    #[error("invalid utf-8")]
    Utf8,

    /// Connection refused, DNS failure or another transport problem.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Response exceeds maximum allowed size.
    #[error("response too large: {0} bytes exceeds limit of {1} bytes")]
    TooLarge(usize, usize),

    /// The AWS IMDSv2 session token could not be acquired.
    #[error("imds token request failed: {0}")]
    Token(#[source] Box<MetadataError>),
}

impl MetadataError {
    /// Whether the server rejected the credentials we sent.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MetadataError::Http(401))
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        if is_timeout(&err) {
            MetadataError::Timeout
        } else {
            MetadataError::Request(err)
        }
    }
}

/// Read timeouts surface as an `io::Error` somewhere down the source chain.
fn is_timeout(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// The metadata service cannot be used: no supported platform was detected,
/// or a mandatory attribute could not be fetched.
#[derive(Debug, Error)]
#[error("{}", UNAVAILABLE_MESSAGE)]
pub struct UnavailableError {
    #[source]
    cause: Option<MetadataError>,
}

impl UnavailableError {
    /// No supported platform was detected.
    pub fn not_detected() -> Self {
        Self { cause: None }
    }

    /// The failure that made the platform's metadata unavailable, if any.
    pub fn cause(&self) -> Option<&MetadataError> {
        self.cause.as_ref()
    }
}

impl From<MetadataError> for UnavailableError {
    fn from(cause: MetadataError) -> Self {
        Self { cause: Some(cause) }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(MetadataError::NotFound.to_string(), "metadata not found");
        assert_eq!(MetadataError::Timeout.to_string(), "request timeout");
        assert_eq!(MetadataError::Http(404).to_string(), "http 404");
        assert_eq!(MetadataError::Utf8.to_string(), "invalid utf-8");
        assert_eq!(
            MetadataError::TooLarge(10, 5).to_string(),
            "response too large: 10 bytes exceeds limit of 5 bytes"
        );
        assert_eq!(
            MetadataError::Token(Box::new(MetadataError::Http(403))).to_string(),
            "imds token request failed: http 403"
        );
    }

    #[test]
    fn test_unauthorized() {
        assert!(MetadataError::Http(401).is_unauthorized());
        assert!(!MetadataError::Http(403).is_unauthorized());
        assert!(!MetadataError::NotFound.is_unauthorized());
    }

    #[test]
    fn test_unavailable_display() {
        assert_eq!(UnavailableError::not_detected().to_string(), UNAVAILABLE_MESSAGE);
        let err = UnavailableError::from(MetadataError::Timeout);
        assert_eq!(err.to_string(), UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_unavailable_source() {
        assert!(UnavailableError::not_detected().source().is_none());
        assert!(UnavailableError::not_detected().cause().is_none());

        let err = UnavailableError::from(MetadataError::Http(500));
        assert!(matches!(err.cause(), Some(MetadataError::Http(500))));
        assert_eq!(err.source().map(|e| e.to_string()), Some("http 500".into()));
    }
}
