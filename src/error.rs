//! Error types for discovery fetch failures.

use std::fmt;

/// Result type for discovery cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by a [`DiscoverySource`](crate::source::DiscoverySource)
/// fetch, returned to callers either directly or as a remembered copy.
///
/// The cache never wraps or suppresses these: what the source produced is
/// what the caller sees. Variants exist so an
/// [`ErrorClassifier`](crate::classify::ErrorClassifier) can decide whether
/// a failure is transient without string matching.
///
/// `Clone` is required because a permanent failure is stored per key and
/// replayed verbatim on every lookup until the next invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Server reported it is temporarily unable to serve the request.
    ///
    /// Classified retryable by [`DefaultClassifier`](crate::classify::DefaultClassifier):
    /// the failure is returned to the current caller and re-attempted on
    /// the next call.
    ServiceUnavailable(String),

    /// Server-side timeout while producing the response.
    ///
    /// Classified retryable by the default policy.
    ServerTimeout(String),

    /// Server is shedding load and asked the client to back off.
    ///
    /// Classified retryable by the default policy. The cache itself never
    /// sleeps or backs off; "retry" means the next caller re-attempts.
    TooManyRequests(String),

    /// The requested group/version, path, or document does not exist.
    ///
    /// Permanent: remembered per key until explicit invalidation.
    NotFound(String),

    /// Response was received but could not be decoded.
    ///
    /// Permanent. The source owns decoding; this is its report that the
    /// payload was unusable.
    MalformedResponse(String),

    /// Transport-level failure (connection, TLS, DNS, ...).
    ///
    /// Permanent under the default policy: transport errors outside the
    /// explicit retryable set are not re-attempted automatically.
    Transport(String),

    /// Generic error with custom message.
    ///
    /// Permanent. Used for failures that fit no other variant.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            Error::ServerTimeout(msg) => write!(f, "Server timeout: {}", msg),
            Error::TooManyRequests(msg) => write!(f, "Too many requests: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
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
            Error::Transport(e.to_string())
        } else {
            Error::MalformedResponse(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
