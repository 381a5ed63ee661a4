//! Run control: a shared cancellation token the scheduler checks at each checkpoint.
//!
//! The control surface calls `cancel()`; the worker sees it at the next
//! checkpoint, and any wait in progress wakes up immediately.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable cancellation flag with an interruptible wait.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        // A poisoned flag still holds a valid bool.
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Request cancellation and wake every waiter.
    pub fn cancel(&self) {
        *self.flag() = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag()
    }

    /// Sleep for `timeout` unless cancelled first.
    /// Returns true when the token was cancelled before or during the wait.
    /// A timeout past the range of `Instant` waits until cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_cancelled();
        };
        let mut cancelled = self.flag();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.inner.wake.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }

    fn wait_cancelled(&self) -> bool {
        let mut cancelled = self.flag();
        while !*cancelled {
            cancelled = match self.inner.wake.wait(cancelled) {
                Ok(guard) => guard,
                Err(e) => e.into_inner(),
            };
        }
        true
    }
}
