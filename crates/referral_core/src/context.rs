//! Per-call cancellation and deadline context.
//!
//! # Responsibility
//! - Carry an optional deadline and a shared cancellation flag into every
//!   store call.
//!
//! # Invariants
//! - Once cancelled, a context (and every clone of it) stays cancelled.
//! - `check()` never blocks.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reason a call was stopped before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

impl Display for Interrupted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl Error for Interrupted {}

/// Cancellation/deadline context passed to repository and service calls.
///
/// Clones share the same cancellation flag, so a caller can hand one clone to
/// a long sweep and cancel it from another.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    /// Context with no deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    /// Builds a context from an optional timeout in milliseconds.
    pub fn from_timeout_ms(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            Some(ms) => Self::with_timeout(Duration::from_millis(ms)),
            None => Self::background(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error when the call must not proceed.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CallContext, Interrupted};
    use std::time::Duration;

    #[test]
    fn background_context_always_passes() {
        assert_eq!(CallContext::background().check(), Ok(()));
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = CallContext::background();
        let clone = ctx.clone();
        clone.cancel();
        assert_eq!(ctx.check(), Err(Interrupted::Cancelled));
    }

    #[test]
    fn elapsed_deadline_is_reported() {
        let ctx = CallContext::with_timeout(Duration::ZERO);
        assert_eq!(ctx.check(), Err(Interrupted::DeadlineExceeded));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_secs(60));
        ctx.cancel();
        assert_eq!(ctx.check(), Err(Interrupted::Cancelled));
    }
}
