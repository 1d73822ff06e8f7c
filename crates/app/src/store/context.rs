//! Per-call deadline and cancellation.

use std::{future::Future, time::Duration};

use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use crate::store::{StoreError, StoreResult};

/// Deadline and cancellation carried into every store call.
///
/// Cloning is cheap and clones share the cancellation signal. A context
/// without a deadline only stops on cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never times out and is only cancelled explicitly.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_in(timeout)
    }

    /// Attach an external cancellation signal, e.g. the server's shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Tighten the deadline to `timeout` from now. An earlier deadline wins.
    #[must_use]
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;

        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });

        self
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run a store operation under this context.
    ///
    /// The operation is not started when the context is already cancelled or
    /// past its deadline, and is dropped mid-flight if either fires. Nothing is
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] or [`StoreError::DeadlineExceeded`],
    /// or whatever error the operation itself produced.
    pub async fn guard<F, T>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(StoreError::DeadlineExceeded);
        }

        tokio::select! {
            biased;

            () = self.cancellation.cancelled() => Err(StoreError::Cancelled),
            result = Self::bounded(self.deadline, operation) => result,
        }
    }

    async fn bounded<F, T>(deadline: Option<Instant>, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match deadline {
            Some(deadline) => timeout_at(deadline, operation)
                .await
                .unwrap_or(Err(StoreError::DeadlineExceeded)),
            None => operation.await,
        }
    }
}
