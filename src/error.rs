//! Error types for the gateway.

use std::fmt;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the cache, the catalog service and the HTTP layer.
///
/// Client-facing variants map one-to-one onto HTTP statuses (see
/// [`Error::status_code`]). Cache and configuration variants never reach the
/// client with their detail: they are reported as a generic internal error.
#[derive(Debug, Clone)]
pub enum Error {
    /// No credential was presented.
    Unauthenticated,

    /// A credential was presented but is malformed, badly signed or expired.
    InvalidToken(String),

    /// The request parameters could not be parsed.
    BadRequest(String),

    /// The principal is valid but its role does not allow the operation.
    Forbidden(String),

    /// The upstream catalog reports the resource as missing.
    NotFound(String),

    /// The upstream catalog could not be reached, timed out, or answered
    /// with something that is not a catalog payload.
    ///
    /// **Recovery:** none inside the gateway. The next request retries
    /// naturally since nothing was cached.
    UpstreamUnavailable(String),

    /// Serialization failed when converting a payload to cache bytes.
    SerializationError(String),

    /// Deserialization failed when converting cache bytes to a payload.
    ///
    /// **Recovery:** the entry is evicted and recomputed.
    DeserializationError(String),

    /// Invalid cache entry: corrupted envelope or bad magic.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend failure.
    BackendError(String),

    /// Invalid configuration value at startup.
    ConfigError(String),

    /// Anything unexpected.
    Internal(String),
}

impl Error {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) => 400,
            Error::Unauthenticated => 401,
            Error::InvalidToken(_) | Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether the detail message may be shown to clients.
    pub fn is_client_visible(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated
                | Error::BadRequest(_)
                | Error::InvalidToken(_)
                | Error::Forbidden(_)
                | Error::NotFound(_)
                | Error::UpstreamUnavailable(_)
        )
    }

    /// Cache-layer errors that should be treated as a miss instead of failing
    /// the request.
    pub fn is_stale_entry(&self) -> bool {
        matches!(
            self,
            Error::DeserializationError(_)
                | Error::InvalidCacheEntry(_)
                | Error::VersionMismatch { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unauthenticated => write!(f, "Unauthenticated"),
            Error::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            Error::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Error::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Internal(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::UpstreamUnavailable(format!("upstream request timed out: {}", e))
        } else if e.is_decode() {
            Error::UpstreamUnavailable(format!("invalid upstream payload: {}", e))
        } else {
            Error::UpstreamUnavailable(e.to_string())
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => Error::InvalidToken("token expired".to_string()),
            ErrorKind::InvalidSignature => {
                Error::InvalidToken("token signature is invalid".to_string())
            }
            _ => Error::InvalidToken(e.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::UpstreamUnavailable("upstream request timed out".to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "Not found: product 42");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::Unauthenticated.status_code(), 401);
        assert_eq!(Error::InvalidToken("x".into()).status_code(), 403);
        assert_eq!(Error::Forbidden("x".into()).status_code(), 403);
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::UpstreamUnavailable("x".into()).status_code(), 500);
        assert_eq!(Error::BackendError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        assert!(Error::UpstreamUnavailable("down".into()).is_client_visible());
        assert!(!Error::SerializationError("boom".into()).is_client_visible());
        assert!(!Error::Internal("boom".into()).is_client_visible());
    }

    #[test]
    fn test_stale_entry_classification() {
        assert!(Error::VersionMismatch {
            expected: 2,
            found: 1
        }
        .is_stale_entry());
        assert!(!Error::BackendError("x".into()).is_stale_entry());
    }
}
