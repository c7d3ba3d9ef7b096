//! Cancellable execution context.
//!
//! One context spans one pipeline invocation (a resolution, a sweep). Every
//! collaborator call runs its I/O through [`Context::run`], so cancelling the
//! context or passing its deadline aborts in-flight work with
//! [`LeetbotError::Cancelled`] instead of hanging or returning a misleading
//! not-found.

use crate::error::LeetbotError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline. Only an explicit [`cancel`](Self::cancel) ends it.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that closes `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Derive a context that is cancelled together with `self`.
    ///
    /// The child keeps the parent's deadline unless `timeout` is shorter.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Run `fut` unless the context closes first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, LeetbotError>
    where
        F: Future<Output = Result<T, LeetbotError>>,
    {
        if self.is_done() {
            return Err(LeetbotError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.done() => Err(LeetbotError::Cancelled),
            result = fut => result,
        }
    }
}
