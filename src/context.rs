//! Per-request cancellation and tracing context.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing::Span;

use crate::error::Cancelled;

#[derive(Debug, Clone)]
/// Carried into every handler and collaborator call.
///
/// Clones share the same cancellation flag and deadline, so cancelling any of them
/// cancels the whole request. The [Span] is the parent for everything logged while
/// serving the request.
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    span: Span,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context that is never cancelled unless [Context::cancel] is called.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            span: Span::current(),
        }
    }

    /// Cancel the request once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel the request at `deadline`, or earlier if a previous deadline was sooner.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Same request, logged under a different span.
    pub fn scoped(&self, span: Span) -> Self {
        Self {
            cancelled: self.cancelled.clone(),
            deadline: self.deadline,
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }

        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Returns `Err(Cancelled)` if the request should stop now.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }

        Ok(())
    }
}
