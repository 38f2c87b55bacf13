//! Admission trait used by the request handler.

/// Decides whether a client's request may proceed.
///
/// The HTTP service is generic over this trait so request handling can be
/// exercised against fixed policies as well as the real [`RateLimiter`].
///
/// [`RateLimiter`]: super::RateLimiter
pub trait AdmissionControl: Send + Sync {
    /// Returns `true` to admit the request, `false` to reject it.
    fn admit(&self, client_id: &str) -> bool;
}
