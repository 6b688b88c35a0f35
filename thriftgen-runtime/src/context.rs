//! Per-call context: deadline and headers.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Context carried by every call, on both the client and the server side.
///
/// A context without a deadline never expires.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    headers: BTreeMap<String, String>,
}

impl Context {
    /// Creates a context with no deadline and no headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an [`Instant`] means no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Creates a context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            headers: BTreeMap::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns all headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Gets a header value.
    #[must_use]
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_without_deadline() {
        let ctx = Context::new();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());
    }

    #[test]
    fn test_context_with_timeout() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        assert!(!ctx.is_expired());
        let remaining = ctx.remaining().unwrap();
        assert!(remaining > Duration::from_secs(50));
        assert!(remaining <= Duration::from_secs(60));
    }

    #[test]
    fn test_context_with_unbounded_timeout() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_expired());
    }

    #[test]
    fn test_context_expired() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_context_headers() {
        let ctx = Context::new().header("caller", "tests").header("trace", "1");
        assert_eq!(ctx.get_header("caller"), Some("tests"));
        assert_eq!(ctx.get_header("missing"), None);
        assert_eq!(ctx.headers().len(), 2);
    }
}
