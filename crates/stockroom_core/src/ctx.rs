//! Call-scoped cancellation and deadline propagation.
//!
//! # Responsibility
//! - Carry an optional deadline and cancellation flag through every store
//!   and repository call.
//! - Let callers abort in-flight work from another thread.
//!
//! # Invariants
//! - A `Context` never un-expires: once cancelled or past its deadline,
//!   `ensure_active` keeps failing.
//! - Cloned contexts share the same cancellation flag.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a context stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Cancelled explicitly through a [`CancelHandle`].
    Cancelled,
    /// The deadline passed before the operation finished.
    DeadlineExceeded,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl Error for ContextError {}

/// Per-call deadline/cancellation carrier passed to every repository and
/// store operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

/// Cancels the paired [`Context`] from any thread.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Marks the paired context as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: None,
        }
    }

    /// A cancellable context plus the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = Self {
            deadline: None,
            cancelled: Some(Arc::clone(&flag)),
        };
        (ctx, CancelHandle(flag))
    }

    /// Returns a copy of this context that additionally expires `timeout`
    /// from now. Cancellation state stays shared.
    pub fn with_deadline_in(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        Self {
            // An outer deadline that is already sooner wins.
            deadline: Some(self.deadline.map_or(candidate, |d| d.min(candidate))),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Fails once this context is cancelled or past its deadline.
    ///
    /// # Errors
    /// - `ContextError::Cancelled` after the paired handle fired.
    /// - `ContextError::DeadlineExceeded` once the deadline passed.
    pub fn ensure_active(&self) -> Result<(), ContextError> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::Acquire) {
                return Err(ContextError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ContextError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, ContextError};
    use std::time::Duration;

    #[test]
    fn background_context_is_always_active() {
        assert!(Context::background().ensure_active().is_ok());
    }

    #[test]
    fn expired_timeout_reports_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::ZERO);
        assert_eq!(ctx.ensure_active(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn cancel_handle_cancels_all_clones() {
        let (ctx, handle) = Context::with_cancel();
        let clone = ctx.clone();
        assert!(clone.ensure_active().is_ok());

        handle.cancel();
        assert_eq!(ctx.ensure_active(), Err(ContextError::Cancelled));
        assert_eq!(clone.ensure_active(), Err(ContextError::Cancelled));
    }

    #[test]
    fn derived_deadline_keeps_cancellation_flag() {
        let (ctx, handle) = Context::with_cancel();
        let scoped = ctx.with_deadline_in(Duration::from_secs(60));
        assert!(scoped.ensure_active().is_ok());

        handle.cancel();
        assert_eq!(scoped.ensure_active(), Err(ContextError::Cancelled));
    }
}
