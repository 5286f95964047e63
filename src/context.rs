//! Per-request execution context.
//!
//! Carries the request id used in log lines and the optional deadline that
//! the lock manager and storage calls honor. One context is created per
//! inbound request and threaded by reference through the whole call chain.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Context for a single SCIM request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlates log lines and errors for one request.
    pub request_id: String,
    /// Absolute instant after which blocking operations give up.
    pub deadline: Option<DateTime<Utc>>,
}

impl RequestContext {
    /// Create a context with an explicit request id and no deadline.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
        }
    }

    /// Create a context with a random request id.
    pub fn with_generated_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Attach an absolute deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Time remaining until the deadline, if one is set.
    ///
    /// Returns `Some(Duration::ZERO)` when the deadline already passed.
    pub fn remaining(&self) -> Option<std::time::Duration> {
        self.deadline.map(|deadline| {
            (deadline - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO)
        })
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn generated_ids_are_unique() {
        let a = RequestContext::with_generated_id();
        let b = RequestContext::with_generated_id();
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn expired_deadline_reports_zero_remaining() {
        let ctx = RequestContext::with_generated_id()
            .with_deadline(Utc::now() - Duration::seconds(5));
        assert_eq!(ctx.remaining(), Some(std::time::Duration::ZERO));
    }
}
