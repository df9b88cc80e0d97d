//! Cooperative cancellation for long-running operations.
//!
//! Chart construction and graph export can run over very large address
//! ranges. Instead of carrying a mutable "cancelled" flag on the graph
//! object, long-running operations take an explicit [`CancelToken`]; the
//! owner keeps a clone and flips it from wherever progress is monitored.
//!
//! Cancellation is cooperative only: the flag is inspected at well-defined
//! points (each new block discovery during construction, each node during
//! export). Once observed, the operation returns whatever partial result it
//! has produced so far — there is no forced preemption and no rollback.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cloneable cancellation flag shared between an operation and its owner.
///
/// All clones observe the same flag. A token that is never cancelled is
/// free: checking costs one relaxed atomic load.
///
/// # Examples
///
/// ```rust
/// use flowscope::CancelToken;
///
/// let token = CancelToken::new();
/// let watcher = token.clone();
/// assert!(!watcher.is_cancelled());
/// token.cancel();
/// assert!(watcher.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation. Idempotent; there is no way to un-cancel.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
