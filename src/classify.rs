//! Pluggable classification of fetch failures.
//!
//! The resource cache needs one bit per failure: is this worth trying
//! again on the next call, or is it terminal until someone invalidates?
//! That policy is a strategy parameter on the client rather than a match
//! baked into the cache, so alternate transport taxonomies can be swapped
//! in without touching the cache logic.

use crate::error::Error;

/// Strategy deciding whether a fetch failure is transient.
///
/// Returning `true` means the failure is returned to the current caller
/// but not remembered: the next lookup for the same key re-attempts the
/// fetch. Returning `false` means the failure is cached and replayed for
/// every lookup on that key until the client is invalidated.
pub trait ErrorClassifier: Send + Sync {
    /// Classify one failure.
    fn is_retryable(&self, error: &Error) -> bool;
}

/// Default classification policy.
///
/// Retryable is exactly the transient-unavailability set: service
/// unavailable, server timeout, and too-many-requests. Everything else,
/// including generic transport errors, is permanent.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn is_retryable(&self, error: &Error) -> bool {
        matches!(
            error,
            Error::ServiceUnavailable(_) | Error::ServerTimeout(_) | Error::TooManyRequests(_)
        )
    }
}

/// Plain functions and closures work as classifiers.
impl<F> ErrorClassifier for F
where
    F: Fn(&Error) -> bool + Send + Sync,
{
    fn is_retryable(&self, error: &Error) -> bool {
        self(error)
    }
}
