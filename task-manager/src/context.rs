use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Returned when an operation does not finish before its request deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Request deadline exceeded")]
pub struct DeadlineExceeded;

/// Per-request deadline handed to every call that performs I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    deadline: Instant,
}

impl RequestContext {
    /// Creates a context whose deadline lies `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Drives `operation` until it completes or the deadline passes.
    ///
    /// The operation is dropped when the deadline passes, which aborts any
    /// statement it has in flight.
    pub async fn run<F>(&self, operation: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.deadline, operation)
            .await
            .map_err(|_| DeadlineExceeded)
    }
}
